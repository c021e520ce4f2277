//! Graph-editing error types.

use crate::graph::id::NodeId;
use crate::graph::socket::SocketType;
use thiserror::Error;

/// Errors that can occur while editing a graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("Node {0:?} already exists")]
    DuplicateNode(NodeId),

    #[error("Node {node:?} has unknown kind '{kind}'")]
    UnknownKind { node: NodeId, kind: String },

    #[error("Node {node:?} has no {direction} socket '{socket}'")]
    UnknownSocket {
        node: NodeId,
        socket: String,
        direction: &'static str,
    },

    #[error("Socket type mismatch: {from} output cannot feed {to} input")]
    TypeMismatch { from: SocketType, to: SocketType },

    #[error("Input '{socket}' of node {node:?} is already connected")]
    InputOccupied { node: NodeId, socket: String },
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;
