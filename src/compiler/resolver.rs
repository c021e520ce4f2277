//! Connection resolution: flow chaining and data expressions.
//!
//! Statement code is produced by following flow connections from an event
//! root, invoking each reached node's emitter. Expression code is produced on
//! demand when an emitter asks for the value of one of its input sockets.
//!
//! Both walks are cycle-guarded. Flow keeps a `visited` set for the whole
//! traversal of one event root, so a back-edge or self-loop truncates to an
//! empty fragment. Data keeps an `evaluating` set of nodes on the current
//! evaluation path, so a data cycle resolves to `None`.

use crate::catalog::{EventHook, NodeCatalog};
use crate::compiler::codegen::event_function_name;
use crate::graph::{GraphModel, NodeId, NodeInstance, ParamValue, SceneId};
use std::collections::HashSet;

/// Counters collected while resolving one or more event roots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    /// Nodes whose kind is not in the catalog.
    pub unknown_kinds: usize,
    /// Flow edges that led back to an already visited node.
    pub truncated_flow: usize,
    /// Data evaluations cut because they re-entered a node.
    pub data_cycles: usize,
}

/// Resolves connections within one scene graph.
pub struct ConnectionResolver<'a> {
    graph: &'a GraphModel,
    catalog: &'a NodeCatalog,
    scene: &'a SceneId,
}

impl<'a> ConnectionResolver<'a> {
    pub fn new(graph: &'a GraphModel, catalog: &'a NodeCatalog, scene: &'a SceneId) -> Self {
        Self {
            graph,
            catalog,
            scene,
        }
    }

    /// Start a fresh traversal with empty visited/evaluating sets.
    pub fn begin(&self) -> Resolution<'a> {
        Resolution {
            graph: self.graph,
            catalog: self.catalog,
            scene: self.scene,
            visited: HashSet::new(),
            evaluating: HashSet::new(),
            stats: ResolveStats::default(),
        }
    }

    /// Emit the code for an event root (or any node) in its own traversal.
    pub fn emit_root(&self, root: NodeId) -> (String, ResolveStats) {
        let mut resolution = self.begin();
        let code = resolution.emit(root);
        (code, resolution.stats)
    }

    /// Code for whatever follows `(node, socket)`, in a fresh traversal.
    pub fn flow(&self, node: NodeId, socket: &str) -> String {
        self.begin().flow(node, socket)
    }

    /// Expression for `(node, socket)`, in a fresh traversal.
    pub fn expression(&self, node: NodeId, socket: &str) -> Option<String> {
        self.begin().expression(node, socket)
    }
}

/// Traversal state shared by every emitter reached from one event root.
pub struct Resolution<'a> {
    graph: &'a GraphModel,
    catalog: &'a NodeCatalog,
    scene: &'a SceneId,
    visited: HashSet<NodeId>,
    evaluating: HashSet<NodeId>,
    stats: ResolveStats,
}

impl<'a> Resolution<'a> {
    pub fn stats(&self) -> ResolveStats {
        self.stats
    }

    pub fn scene(&self) -> &SceneId {
        self.scene
    }

    /// Code for the node reached through the first connection leaving
    /// `(node, socket)`. Empty when nothing is connected or the target was
    /// already emitted in this traversal.
    pub fn flow(&mut self, node: NodeId, socket: &str) -> String {
        let Some(conn) = self.graph.first_connection_from(node, socket) else {
            return String::new();
        };
        let target = conn.to.node;
        self.emit(target)
    }

    /// Run the emitter of `node`, marking it visited.
    pub fn emit(&mut self, node: NodeId) -> String {
        if !self.visited.insert(node) {
            tracing::debug!(scene = %self.scene, node = %node, "flow cycle truncated");
            self.stats.truncated_flow += 1;
            return String::new();
        }
        let Some(instance) = self.graph.node(node) else {
            return String::new();
        };
        let Some(def) = self.catalog.get(&instance.kind) else {
            self.stats.unknown_kinds += 1;
            tracing::debug!(node = %node, kind = %instance.kind, "unknown node kind");
            return format!("// Unknown node kind: {}\n", instance.kind);
        };
        (def.emit)(node, instance, self)
    }

    /// Expression feeding `(node, socket)`: the upstream output when a
    /// connection arrives there, otherwise the node's own value for that
    /// socket name.
    pub fn expression(&mut self, node: NodeId, socket: &str) -> Option<String> {
        match self.graph.first_connection_into(node, socket) {
            Some(conn) => {
                let upstream = conn.from.node;
                let output = conn.from.socket.clone();
                self.value(upstream, &output)
            }
            None => self.value(node, socket),
        }
    }

    /// Like [`expression`](Self::expression), but parenthesized when the
    /// result is compound so it can be used as an operand.
    pub fn operand(&mut self, node: NodeId, socket: &str) -> Option<String> {
        self.expression(node, socket).map(|expr| {
            if expr.contains(' ') && !is_quoted(&expr) {
                format!("({})", expr)
            } else {
                expr
            }
        })
    }

    pub fn input_wired(&self, node: NodeId, socket: &str) -> bool {
        self.graph.first_connection_into(node, socket).is_some()
    }

    /// Instance override of a parameter, else the kind's declared default.
    pub fn parameter(&self, instance: &NodeInstance, name: &str) -> Option<ParamValue> {
        instance.parameters.get(name).cloned().or_else(|| {
            self.catalog
                .get(&instance.kind)
                .and_then(|def| def.default_param(name))
        })
    }

    /// Unquoted text of a parameter; empty when absent.
    pub fn text_param(&self, instance: &NodeInstance, name: &str) -> String {
        self.parameter(instance, name)
            .map(|value| value.as_text())
            .unwrap_or_default()
    }

    /// Name of the generated function for an event node of this scene.
    pub fn event_function(&self, hook: EventHook, node: NodeId) -> String {
        event_function_name(hook, self.scene, node)
    }

    fn value(&mut self, node: NodeId, socket: &str) -> Option<String> {
        let instance = self.graph.node(node)?;
        let Some(def) = self.catalog.get(&instance.kind) else {
            return instance.parameters.get(socket).map(ParamValue::to_expression);
        };

        if let Some(evaluate) = def.evaluate.filter(|_| def.has_output(socket)) {
            let mut data_inputs = def.data_inputs().peekable();
            if data_inputs.peek().is_some()
                && !data_inputs.any(|input| self.input_wired(node, input.name))
            {
                return None;
            }
            if !self.evaluating.insert(node) {
                tracing::debug!(scene = %self.scene, node = %node, "data cycle cut");
                self.stats.data_cycles += 1;
                return None;
            }
            let result = evaluate(node, instance, socket, self);
            self.evaluating.remove(&node);
            return result;
        }

        self.parameter(instance, socket)
            .map(|value| value.to_expression())
    }
}

fn is_quoted(expr: &str) -> bool {
    expr.len() >= 2
        && expr.starts_with('"')
        && expr.ends_with('"')
        && !expr[1..expr.len() - 1].contains('"')
}
