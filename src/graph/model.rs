//! Node instances, connections and the graph that owns them.

use crate::catalog::NodeCatalog;
use crate::error::{Result, ResultExt};
use crate::graph::error::{GraphError, GraphResult};
use crate::graph::id::{NodeId, SceneId};
use crate::graph::socket::{SocketDirection, SocketType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A literal parameter value attached to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ParamValue {
    /// Render this literal as a script expression.
    pub fn to_expression(&self) -> String {
        match self {
            ParamValue::Bool(b) => b.to_string(),
            ParamValue::Number(n) => format_number(*n),
            ParamValue::Text(s) => quote(s),
        }
    }

    /// The raw text of this value, unquoted. Numbers and booleans are
    /// rendered the way [`to_expression`](Self::to_expression) would.
    pub fn as_text(&self) -> String {
        match self {
            ParamValue::Text(s) => s.clone(),
            other => other.to_expression(),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

/// Format a number as a script literal. Whole numbers drop the fraction so
/// `42.0` renders as `42`.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return "0".to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Quote a string as a double-quoted script literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Position of a node on the editor canvas. Ignored by compilation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasPoint {
    pub x: f32,
    pub y: f32,
}

impl CanvasPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One node placed in a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInstance {
    /// Name of the node kind in the catalog. May name a kind that does not
    /// exist; the compiler degrades such nodes to comments.
    pub kind: String,
    #[serde(default)]
    pub position: CanvasPoint,
    /// Per-instance overrides of the kind's default parameters.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, ParamValue>,
}

impl NodeInstance {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            position: CanvasPoint::default(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn at(mut self, position: CanvasPoint) -> Self {
        self.position = position;
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

/// One end of a connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub node: NodeId,
    pub socket: String,
}

impl Endpoint {
    pub fn new(node: NodeId, socket: impl Into<String>) -> Self {
        Self {
            node,
            socket: socket.into(),
        }
    }
}

/// A directed connection from an output socket to an input socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub from: Endpoint,
    pub to: Endpoint,
    #[serde(rename = "type")]
    pub ty: SocketType,
}

impl Connection {
    pub fn touches(&self, node: NodeId) -> bool {
        self.from.node == node || self.to.node == node
    }
}

/// A non-fatal problem found by [`GraphModel::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum GraphIssue {
    UnknownKind { node: NodeId, kind: String },
    DanglingConnection { index: usize, node: NodeId },
    UnknownSocket { index: usize, node: NodeId, socket: String },
    TypeMismatch { index: usize },
}

/// The node instances and connections of one scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphModel {
    #[serde(default)]
    pub nodes: BTreeMap<NodeId, NodeInstance>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeInstance> {
        self.nodes.get(&id)
    }

    /// Place a new node and return its id (one past the highest id in use).
    pub fn add_node(&mut self, kind: impl Into<String>, position: CanvasPoint) -> NodeId {
        let id = self
            .nodes
            .keys()
            .next_back()
            .map(|last| last.next())
            .unwrap_or_default();
        self.nodes.insert(id, NodeInstance::new(kind).at(position));
        tracing::trace!(node = %id, "node added");
        id
    }

    /// Insert a node under a caller-chosen id.
    pub fn insert_node(&mut self, id: NodeId, instance: NodeInstance) -> GraphResult<()> {
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        self.nodes.insert(id, instance);
        Ok(())
    }

    /// Remove a node and every connection touching it.
    pub fn remove_node(&mut self, id: NodeId) -> GraphResult<NodeInstance> {
        if !self.nodes.contains_key(&id) {
            return Err(GraphError::UnknownNode(id));
        }
        let before = self.connections.len();
        self.connections.retain(|c| !c.touches(id));
        tracing::trace!(
            node = %id,
            dropped = before - self.connections.len(),
            "node removed"
        );
        self.nodes.remove(&id).ok_or(GraphError::UnknownNode(id))
    }

    pub fn set_node_position(&mut self, id: NodeId, position: CanvasPoint) -> GraphResult<()> {
        let node = self.nodes.get_mut(&id).ok_or(GraphError::UnknownNode(id))?;
        node.position = position;
        Ok(())
    }

    pub fn set_parameter(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> GraphResult<()> {
        let node = self.nodes.get_mut(&id).ok_or(GraphError::UnknownNode(id))?;
        node.parameters.insert(name.into(), value.into());
        Ok(())
    }

    /// Connect an output socket to an input socket after checking both
    /// exist and carry the same type. A data input accepts one connection.
    pub fn connect(
        &mut self,
        catalog: &NodeCatalog,
        from: Endpoint,
        to: Endpoint,
    ) -> GraphResult<()> {
        let from_ty = self.socket_type(catalog, &from, SocketDirection::Output)?;
        let to_ty = self.socket_type(catalog, &to, SocketDirection::Input)?;
        if from_ty != to_ty {
            return Err(GraphError::TypeMismatch {
                from: from_ty,
                to: to_ty,
            });
        }
        if !to_ty.is_flow() && self.first_connection_into(to.node, &to.socket).is_some() {
            return Err(GraphError::InputOccupied {
                node: to.node,
                socket: to.socket,
            });
        }
        self.connections.push(Connection {
            from,
            to,
            ty: from_ty,
        });
        Ok(())
    }

    /// Append a connection without any validation.
    pub fn connect_unchecked(&mut self, connection: Connection) {
        self.connections.push(connection);
    }

    /// Remove the connection between two endpoints. Returns whether one
    /// existed.
    pub fn disconnect(&mut self, from: &Endpoint, to: &Endpoint) -> bool {
        match self
            .connections
            .iter()
            .position(|c| &c.from == from && &c.to == to)
        {
            Some(index) => {
                self.connections.remove(index);
                true
            }
            None => false,
        }
    }

    /// The first connection leaving `(node, socket)`.
    pub fn first_connection_from(&self, node: NodeId, socket: &str) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.from.node == node && c.from.socket == socket)
    }

    /// The first connection arriving at `(node, socket)`.
    pub fn first_connection_into(&self, node: NodeId, socket: &str) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.to.node == node && c.to.socket == socket)
    }

    pub fn connections_from(&self, node: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.from.node == node)
    }

    pub fn connections_into(&self, node: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.to.node == node)
    }

    /// Report structural problems without failing. The compiler tolerates
    /// every issue listed here.
    pub fn validate(&self, catalog: &NodeCatalog) -> Vec<GraphIssue> {
        let mut issues = Vec::new();

        for (id, node) in &self.nodes {
            if catalog.get(&node.kind).is_none() {
                issues.push(GraphIssue::UnknownKind {
                    node: *id,
                    kind: node.kind.clone(),
                });
            }
        }

        for (index, conn) in self.connections.iter().enumerate() {
            let mut types = Vec::with_capacity(2);
            for (endpoint, direction) in [
                (&conn.from, SocketDirection::Output),
                (&conn.to, SocketDirection::Input),
            ] {
                let Some(node) = self.nodes.get(&endpoint.node) else {
                    issues.push(GraphIssue::DanglingConnection {
                        index,
                        node: endpoint.node,
                    });
                    continue;
                };
                let Some(def) = catalog.get(&node.kind) else {
                    continue;
                };
                match def.socket(&endpoint.socket, direction) {
                    Some(socket) => types.push(socket.ty),
                    None => issues.push(GraphIssue::UnknownSocket {
                        index,
                        node: endpoint.node,
                        socket: endpoint.socket.clone(),
                    }),
                }
            }
            if types.iter().any(|ty| *ty != conn.ty) {
                issues.push(GraphIssue::TypeMismatch { index });
            }
        }

        issues
    }

    fn socket_type(
        &self,
        catalog: &NodeCatalog,
        endpoint: &Endpoint,
        direction: SocketDirection,
    ) -> GraphResult<SocketType> {
        let node = self
            .nodes
            .get(&endpoint.node)
            .ok_or(GraphError::UnknownNode(endpoint.node))?;
        let def = catalog.get(&node.kind).ok_or_else(|| GraphError::UnknownKind {
            node: endpoint.node,
            kind: node.kind.clone(),
        })?;
        def.socket(&endpoint.socket, direction)
            .map(|s| s.ty)
            .ok_or_else(|| GraphError::UnknownSocket {
                node: endpoint.node,
                socket: endpoint.socket.clone(),
                direction: match direction {
                    SocketDirection::Input => "input",
                    SocketDirection::Output => "output",
                },
            })
    }
}

/// A set of scene graphs compiled together into one script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub scenes: BTreeMap<SceneId, GraphModel>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scene(mut self, id: impl Into<SceneId>, graph: GraphModel) -> Self {
        self.scenes.insert(id.into(), graph);
        self
    }

    /// Load a project from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read project file {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse project file {:?}", path))
    }

    /// Save the project as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self).context("Failed to serialize project")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write project file {:?}", path))
    }
}
