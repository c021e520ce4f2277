//! World snapshot shared between the host and the sandbox.
//!
//! The snapshot is plain data. It is handed to the sandbox by value each
//! tick, converted to a Rhai object map, bound as `this` for the generated
//! entry points and converted back afterwards. Field names are therefore
//! part of the script surface: `this.objects["player"].position.x`,
//! `this.input.held`, `this.timers["t"].elapsed` and so on.

use crate::error::{Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Entity id → set of entity ids it currently overlaps.
pub type CollisionMap = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

fn default_collidable() -> bool {
    true
}

/// A world object. Only `Physics` entities are integrated each tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Entity {
    Static {
        position: Vec2,
        size: Vec2,
        #[serde(default)]
        rotation: f64,
        #[serde(default = "default_collidable")]
        collidable: bool,
    },
    Physics {
        position: Vec2,
        size: Vec2,
        #[serde(default)]
        rotation: f64,
        #[serde(default = "default_collidable")]
        collidable: bool,
        #[serde(default)]
        velocity: Vec2,
        #[serde(default)]
        acceleration: Vec2,
    },
}

impl Entity {
    pub fn fixed(position: Vec2, size: Vec2) -> Self {
        Entity::Static {
            position,
            size,
            rotation: 0.0,
            collidable: true,
        }
    }

    pub fn physics(position: Vec2, size: Vec2) -> Self {
        Entity::Physics {
            position,
            size,
            rotation: 0.0,
            collidable: true,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
        }
    }

    pub fn with_velocity(mut self, v: Vec2) -> Self {
        if let Entity::Physics { velocity, .. } = &mut self {
            *velocity = v;
        }
        self
    }

    pub fn with_collidable(mut self, value: bool) -> Self {
        match &mut self {
            Entity::Static { collidable, .. } | Entity::Physics { collidable, .. } => {
                *collidable = value
            }
        }
        self
    }

    pub fn position(&self) -> Vec2 {
        match self {
            Entity::Static { position, .. } | Entity::Physics { position, .. } => *position,
        }
    }

    pub fn size(&self) -> Vec2 {
        match self {
            Entity::Static { size, .. } | Entity::Physics { size, .. } => *size,
        }
    }

    pub fn is_collidable(&self) -> bool {
        match self {
            Entity::Static { collidable, .. } | Entity::Physics { collidable, .. } => *collidable,
        }
    }

    pub fn velocity(&self) -> Option<Vec2> {
        match self {
            Entity::Physics { velocity, .. } => Some(*velocity),
            Entity::Static { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    pub width: f64,
    pub height: f64,
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Constants {
    pub screen: Screen,
    /// Added to every physics entity's vertical acceleration each tick.
    pub gravity: f64,
}

/// Keyboard state. `pressed` holds keys that went down since the last
/// tick and is cleared by the host after each one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputState {
    pub held: BTreeSet<String>,
    pub pressed: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Timer {
    pub elapsed: f64,
    pub active: bool,
}

fn default_text_size() -> f64 {
    16.0
}

fn default_text_color() -> String {
    "#ffffff".to_string()
}

/// A text overlay requested by the script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLabel {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub position: Vec2,
    #[serde(default = "default_text_size")]
    pub size: f64,
    #[serde(default = "default_text_color")]
    pub color: String,
}

/// The mutable game state a compiled script operates on.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSnapshot {
    pub objects: BTreeMap<String, Entity>,
    pub constants: Constants,
    pub input: InputState,
    pub timers: BTreeMap<String, Timer>,
    pub texts: BTreeMap<String, TextLabel>,
    /// Recomputed by the sandbox every tick.
    pub collisions: CollisionMap,
    pub variables: BTreeMap<String, serde_json::Value>,
}

impl WorldSnapshot {
    pub fn new(screen: Screen, gravity: f64) -> Self {
        Self {
            constants: Constants { screen, gravity },
            ..Default::default()
        }
    }

    pub fn with_object(mut self, id: impl Into<String>, entity: Entity) -> Self {
        self.objects.insert(id.into(), entity);
        self
    }

    pub fn object(&self, id: &str) -> Option<&Entity> {
        self.objects.get(id)
    }

    pub fn variable(&self, name: &str) -> Option<&serde_json::Value> {
        self.variables.get(name)
    }

    pub fn is_colliding(&self, a: &str, b: &str) -> bool {
        self.collisions.get(a).is_some_and(|set| set.contains(b))
    }

    /// Load a snapshot from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read world file {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse world file {:?}", path))
    }
}
