//! The sandbox state machine.
//!
//! ```text
//! Empty ──load──► Loaded ──init──► Initialized ──tick──► Running ─┐
//!   ▲               │                  │  ▲                 │  ▲  │ tick
//!   └─ load error ──┘                  │  └──── init ───────┘  └──┘
//!                                      └──── end_game() ──► Ended
//! ```
//!
//! `load` is accepted in every state and replaces the previous script. In
//! `Ended` every other call is a no-op that reports [`TickOutcome::Ended`].

use crate::config::SandboxLimits;
use crate::sandbox::engine::{
    innermost_position, GameScript, ScriptRuntime, COLLISION_FN, INIT_FN, UPDATE_FN,
};
use crate::sandbox::simulation;
use crate::sandbox::{Phase, SandboxError};
use crate::world::{CollisionMap, WorldSnapshot};
use rhai::{Dynamic, EvalAltResult};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxState {
    Empty,
    Loaded,
    Initialized,
    Running,
    Ended,
}

/// Result of a successful init or tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    /// `end_game()` was called, now or earlier.
    Ended,
}

/// Executes a loaded script against world snapshots.
#[derive(Debug)]
pub struct SandboxExecutor {
    runtime: ScriptRuntime,
    script: Option<GameScript>,
    state: SandboxState,
    previous_collisions: CollisionMap,
}

impl SandboxExecutor {
    pub fn new(limits: &SandboxLimits) -> Self {
        Self {
            runtime: ScriptRuntime::new(limits),
            script: None,
            state: SandboxState::Empty,
            previous_collisions: CollisionMap::new(),
        }
    }

    pub fn state(&self) -> SandboxState {
        self.state
    }

    pub fn script(&self) -> Option<&GameScript> {
        self.script.as_ref()
    }

    /// Compile `source` and make it the current script. On failure the
    /// previous script is discarded and the executor is `Empty`.
    pub fn load(&mut self, source: &str) -> Result<(), SandboxError> {
        self.script = None;
        self.state = SandboxState::Empty;
        self.previous_collisions.clear();
        self.runtime.clear_end_request();

        let script = self.runtime.load(source)?;
        tracing::debug!(
            init = script.has_init(),
            update = script.has_update(),
            on_collision = script.has_on_collision(),
            "script loaded"
        );
        self.script = Some(script);
        self.state = SandboxState::Loaded;
        Ok(())
    }

    /// Run `init()` against `world`. Also used to re-initialize a running
    /// script with a fresh world.
    pub fn init(&mut self, world: &mut WorldSnapshot) -> Result<TickOutcome, SandboxError> {
        match self.state {
            SandboxState::Ended => return Ok(TickOutcome::Ended),
            SandboxState::Empty => {
                return Err(SandboxError::InvalidState {
                    operation: "init",
                    state: self.state,
                })
            }
            SandboxState::Loaded | SandboxState::Initialized | SandboxState::Running => {}
        }
        let Some(script) = self.script.as_ref() else {
            return Err(SandboxError::InvalidState {
                operation: "init",
                state: self.state,
            });
        };

        self.previous_collisions.clear();
        let mut ctx = to_script(world)?;
        let result = if script.has_init() {
            self.runtime.call(script, &mut ctx, INIT_FN, ())
        } else {
            Ok(())
        };
        let restored = restore(world, &ctx);
        result.map_err(|err| runtime_error(Phase::Init, &err))?;
        restored?;

        self.state = SandboxState::Initialized;
        Ok(self.check_end())
    }

    /// Advance the world by `delta` seconds.
    ///
    /// Order: physics and timers, collision detection, `on_collision` for
    /// every newly overlapping ordered pair, then `update(delta)`.
    pub fn tick(
        &mut self,
        world: &mut WorldSnapshot,
        delta: f64,
    ) -> Result<TickOutcome, SandboxError> {
        match self.state {
            SandboxState::Ended => return Ok(TickOutcome::Ended),
            SandboxState::Empty | SandboxState::Loaded => {
                return Err(SandboxError::InvalidState {
                    operation: "tick",
                    state: self.state,
                })
            }
            SandboxState::Initialized | SandboxState::Running => {}
        }
        let Some(script) = self.script.as_ref() else {
            return Err(SandboxError::InvalidState {
                operation: "tick",
                state: self.state,
            });
        };

        simulation::apply_physics(world, delta);
        simulation::advance_timers(world, delta);

        let collisions = simulation::detect_collisions(world);
        let entered = simulation::entered_pairs(&self.previous_collisions, &collisions);
        world.collisions = collisions.clone();
        self.previous_collisions = collisions;
        self.state = SandboxState::Running;

        let mut ctx = to_script(world)?;
        let result = Self::run_tick(&self.runtime, script, &mut ctx, &entered, delta);
        let restored = restore(world, &ctx);
        result?;
        restored?;

        Ok(self.check_end())
    }

    fn run_tick(
        runtime: &ScriptRuntime,
        script: &GameScript,
        ctx: &mut Dynamic,
        entered: &[(String, String)],
        delta: f64,
    ) -> Result<(), SandboxError> {
        if script.has_on_collision() {
            for (subject, other) in entered {
                tracing::trace!(%subject, %other, "collision entered");
                runtime
                    .call(script, ctx, COLLISION_FN, (subject.clone(), other.clone()))
                    .map_err(|err| runtime_error(Phase::Collision, &err))?;
            }
        }
        if script.has_update() {
            runtime
                .call(script, ctx, UPDATE_FN, (delta,))
                .map_err(|err| runtime_error(Phase::Update, &err))?;
        }
        Ok(())
    }

    fn check_end(&mut self) -> TickOutcome {
        if self.runtime.end_requested() {
            tracing::info!("script requested end of game");
            self.state = SandboxState::Ended;
            TickOutcome::Ended
        } else {
            TickOutcome::Continue
        }
    }
}

fn runtime_error(phase: Phase, err: &EvalAltResult) -> SandboxError {
    let (line, column) = innermost_position(err);
    SandboxError::Runtime {
        phase,
        message: err.to_string(),
        line,
        column,
    }
}

/// Convert a snapshot into the object map scripts see as `this`.
pub fn to_script(world: &WorldSnapshot) -> Result<Dynamic, SandboxError> {
    rhai::serde::to_dynamic(world).map_err(|e| SandboxError::Snapshot(e.to_string()))
}

/// Write a script object map back into `world`, going through JSON so
/// integers written by scripts are accepted for float fields. If the map no
/// longer forms a valid snapshot, entries that still parse are kept, malformed
/// ones are dropped and the parse error is returned.
pub fn restore(world: &mut WorldSnapshot, ctx: &Dynamic) -> Result<(), SandboxError> {
    let value: serde_json::Value =
        rhai::serde::from_dynamic(ctx).map_err(|e| SandboxError::Snapshot(e.to_string()))?;
    match serde_json::from_value::<WorldSnapshot>(value.clone()) {
        Ok(restored) => {
            *world = restored;
            Ok(())
        }
        Err(err) => {
            tracing::warn!(error = %err, "script left a malformed world; salvaging entries");
            salvage(world, &value);
            Err(SandboxError::Snapshot(err.to_string()))
        }
    }
}

fn salvage(world: &mut WorldSnapshot, value: &serde_json::Value) {
    let Some(fields) = value.as_object() else {
        return;
    };
    salvage_entries(&mut world.objects, fields.get("objects"), "objects");
    salvage_entries(&mut world.timers, fields.get("timers"), "timers");
    salvage_entries(&mut world.texts, fields.get("texts"), "texts");
    salvage_entries(&mut world.collisions, fields.get("collisions"), "collisions");
    salvage_entries(&mut world.variables, fields.get("variables"), "variables");
    salvage_field(&mut world.constants, fields.get("constants"));
    salvage_field(&mut world.input, fields.get("input"));
}

fn salvage_entries<T: DeserializeOwned>(
    target: &mut BTreeMap<String, T>,
    value: Option<&serde_json::Value>,
    field: &str,
) {
    let Some(entries) = value.and_then(serde_json::Value::as_object) else {
        return;
    };
    *target = entries
        .iter()
        .filter_map(|(key, entry)| match serde_json::from_value(entry.clone()) {
            Ok(parsed) => Some((key.clone(), parsed)),
            Err(err) => {
                tracing::warn!(field, %key, error = %err, "dropping malformed entry");
                None
            }
        })
        .collect();
}

fn salvage_field<T: DeserializeOwned>(target: &mut T, value: Option<&serde_json::Value>) {
    if let Some(parsed) = value.and_then(|v| serde_json::from_value(v.clone()).ok()) {
        *target = parsed;
    }
}
