//! Ready-made world snapshots

use nodescript_rs::world::{Entity, Screen, Vec2, WorldSnapshot};

/// A 10x10 static box centered at `(x, y)`
pub fn block(x: f64, y: f64) -> Entity {
    Entity::fixed(Vec2::new(x, y), Vec2::new(10.0, 10.0))
}

/// Empty world with the given gravity
pub fn empty_world(gravity: f64) -> WorldSnapshot {
    WorldSnapshot::new(Screen::default(), gravity)
}

/// World with a static `player` at the origin
pub fn player_world() -> WorldSnapshot {
    empty_world(0.0).with_object("player", block(0.0, 0.0))
}

/// Move an entity between ticks, the way a host-side editor would
pub fn place(world: &mut WorldSnapshot, id: &str, x: f64, y: f64) {
    if let Some(entity) = world.objects.get_mut(id) {
        match entity {
            Entity::Static { position, .. } | Entity::Physics { position, .. } => {
                *position = Vec2::new(x, y)
            }
        }
    }
}

/// Read a numeric variable written by a script
pub fn number_var(world: &WorldSnapshot, name: &str) -> Option<f64> {
    world.variable(name).and_then(|v| v.as_f64())
}
