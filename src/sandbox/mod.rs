//! Sandboxed script execution.
//!
//! The sandbox owns a Rhai engine and the currently loaded script and runs
//! on its own thread. The host reaches it only through a pair of bounded
//! channels:
//!
//! ```text
//! Host                                 Sandbox thread
//!  │ ── Load{code} ──────────────────►  compile, run top level
//!  │ ◄────────────────────── Loaded ──   (or Error)
//!  │ ── Init{ctx} ───────────────────►  init()
//!  │ ◄──────────────── Inited{ctx} ──   (or End / Error)
//!  │ ── Update{ctx, delta} ──────────►  physics, collisions,
//!  │                                     on_collision(), update()
//!  │ ◄─────────────── Updated{ctx} ──   (or End / Error)
//!  │ ── Shutdown ────────────────────►  thread exits
//! ```
//!
//! The world snapshot travels by value in both directions, so exactly one
//! side owns it at any time.

pub mod engine;
pub mod executor;
pub mod simulation;
pub mod worker;

pub use engine::{GameScript, ScriptRuntime};
pub use executor::{SandboxExecutor, SandboxState, TickOutcome};
pub use worker::{spawn_sandbox, SandboxBridge, SandboxWorker};

use crate::world::WorldSnapshot;
use std::fmt;
use thiserror::Error;

/// Which part of the sandbox protocol an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Load,
    Init,
    Collision,
    Update,
    /// Converting the world to or from the script representation
    Snapshot,
    /// A request arrived in a state that cannot serve it
    Protocol,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Load => "load",
            Phase::Init => "init",
            Phase::Collision => "collision",
            Phase::Update => "update",
            Phase::Snapshot => "snapshot",
            Phase::Protocol => "protocol",
        };
        f.write_str(name)
    }
}

/// Structured description of a sandbox failure, sent to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorDetail {
    pub phase: Phase,
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error", self.phase)?;
        if let Some(line) = self.line {
            write!(f, " at line {}", line)?;
            if let Some(column) = self.column {
                write!(f, ", column {}", column)?;
            }
        }
        write!(f, ": {}", self.message)
    }
}

/// Errors produced by the sandbox executor.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SandboxError {
    #[error("Script failed to load: {message}")]
    Load {
        message: String,
        line: Option<usize>,
        column: Option<usize>,
    },

    #[error("Script failed during {phase}: {message}")]
    Runtime {
        phase: Phase,
        message: String,
        line: Option<usize>,
        column: Option<usize>,
    },

    #[error("World snapshot conversion failed: {0}")]
    Snapshot(String),

    #[error("Cannot {operation} while sandbox is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SandboxState,
    },
}

impl SandboxError {
    /// Flatten into the payload sent across the channel.
    pub fn detail(&self) -> ErrorDetail {
        match self {
            SandboxError::Load {
                message,
                line,
                column,
            } => ErrorDetail {
                phase: Phase::Load,
                message: message.clone(),
                line: *line,
                column: *column,
            },
            SandboxError::Runtime {
                phase,
                message,
                line,
                column,
            } => ErrorDetail {
                phase: *phase,
                message: message.clone(),
                line: *line,
                column: *column,
            },
            SandboxError::Snapshot(message) => ErrorDetail {
                phase: Phase::Snapshot,
                message: message.clone(),
                line: None,
                column: None,
            },
            SandboxError::InvalidState { .. } => ErrorDetail {
                phase: Phase::Protocol,
                message: self.to_string(),
                line: None,
                column: None,
            },
        }
    }
}

/// Messages from the host to the sandbox thread.
#[derive(Debug, Clone)]
pub enum SandboxRequest {
    Load { code: String },
    Init { ctx: WorldSnapshot },
    Update { ctx: WorldSnapshot, delta: f64 },
    Shutdown,
}

/// Messages from the sandbox thread back to the host.
#[derive(Debug, Clone)]
pub enum SandboxResponse {
    Loaded,
    Inited { ctx: WorldSnapshot },
    Updated { ctx: WorldSnapshot },
    /// The script called `end_game()`. No further updates will run.
    End { ctx: WorldSnapshot },
    /// `ctx` is returned whenever the request carried one.
    Error {
        detail: ErrorDetail,
        ctx: Option<WorldSnapshot>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detail_display() {
        let detail = ErrorDetail {
            phase: Phase::Update,
            message: "Variable not found: x".into(),
            line: Some(3),
            column: Some(9),
        };
        assert_eq!(
            detail.to_string(),
            "update error at line 3, column 9: Variable not found: x"
        );
    }

    #[test]
    fn test_invalid_state_detail_is_protocol() {
        let err = SandboxError::InvalidState {
            operation: "tick",
            state: SandboxState::Loaded,
        };
        assert_eq!(err.detail().phase, Phase::Protocol);
    }
}
