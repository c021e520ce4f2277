//! Graph model consumed by the compiler.
//!
//! A scene's behavior is a directed graph of node instances joined by typed
//! connections:
//!
//! ```text
//! [OnUpdate] ──flow──► [If] ──true──► [Move]
//!                       ▲               ▲
//!            [Input] ───┘ condition     └── dx ── [Constant]
//! ```
//!
//! Flow connections sequence statements; data connections feed input
//! sockets with expressions. The editor that produces graphs and the storage
//! that persists them live outside this crate.

pub mod error;
pub mod id;
pub mod model;
pub mod socket;

pub use error::{GraphError, GraphResult};
pub use id::{NodeId, SceneId};
pub use model::{
    format_number, quote, CanvasPoint, Connection, Endpoint, GraphIssue, GraphModel, NodeInstance,
    ParamValue, Project,
};
pub use socket::{SocketDescriptor, SocketDirection, SocketType};
