//! Socket descriptors for the node system.
//!
//! Each node kind declares its sockets via static `SocketDescriptor` arrays.
//! The graph uses these to validate connections and the resolver uses them
//! to tell flow chaining from data resolution.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of value travelling over a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocketType {
    /// Control flow (statement sequencing).
    Flow,
    Number,
    String,
    Boolean,
}

impl SocketType {
    pub fn is_flow(self) -> bool {
        self == SocketType::Flow
    }
}

impl fmt::Display for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SocketType::Flow => "flow",
            SocketType::Number => "number",
            SocketType::String => "string",
            SocketType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// Whether a socket is an input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketDirection {
    Input,
    Output,
}

/// Static descriptor for a node's socket.
#[derive(Debug, Clone)]
pub struct SocketDescriptor {
    pub name: &'static str,
    pub direction: SocketDirection,
    pub ty: SocketType,
}

impl SocketDescriptor {
    pub const fn input(name: &'static str, ty: SocketType) -> Self {
        Self {
            name,
            direction: SocketDirection::Input,
            ty,
        }
    }

    pub const fn output(name: &'static str, ty: SocketType) -> Self {
        Self {
            name,
            direction: SocketDirection::Output,
            ty,
        }
    }
}
