//! Test data builders for graphs, nodes and connections

use nodescript_rs::graph::{
    Connection, Endpoint, GraphModel, NodeId, NodeInstance, ParamValue, Project, SceneId,
    SocketType,
};

/// Builder for a single node instance with a fixed id
pub struct NodeBuilder {
    id: NodeId,
    instance: NodeInstance,
}

impl NodeBuilder {
    pub fn new(id: u32, kind: &str) -> Self {
        Self {
            id: NodeId(id),
            instance: NodeInstance::new(kind),
        }
    }

    pub fn param(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.instance.parameters.insert(name.to_string(), value.into());
        self
    }

    pub fn build(self) -> (NodeId, NodeInstance) {
        (self.id, self.instance)
    }
}

/// Builder for a connection between two sockets
pub struct ConnectionBuilder {
    from: Endpoint,
    to: Endpoint,
    ty: SocketType,
}

impl ConnectionBuilder {
    /// A flow connection from `from.socket` to `to.flow`
    pub fn flow(from: u32, socket: &str, to: u32) -> Self {
        Self {
            from: Endpoint::new(NodeId(from), socket),
            to: Endpoint::new(NodeId(to), "flow"),
            ty: SocketType::Flow,
        }
    }

    /// A number-typed data connection
    pub fn data(from: u32, output: &str, to: u32, input: &str) -> Self {
        Self {
            from: Endpoint::new(NodeId(from), output),
            to: Endpoint::new(NodeId(to), input),
            ty: SocketType::Number,
        }
    }

    pub fn ty(mut self, ty: SocketType) -> Self {
        self.ty = ty;
        self
    }

    pub fn build(self) -> Connection {
        Connection {
            from: self.from,
            to: self.to,
            ty: self.ty,
        }
    }
}

/// Builder for a scene graph. Connections are inserted unchecked so tests
/// can describe malformed graphs too.
#[derive(Default)]
pub struct GraphBuilder {
    graph: GraphModel,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, node: NodeBuilder) -> Self {
        let (id, instance) = node.build();
        self.graph.nodes.insert(id, instance);
        self
    }

    pub fn connection(mut self, connection: ConnectionBuilder) -> Self {
        self.graph.connect_unchecked(connection.build());
        self
    }

    /// Shorthand for `connection(ConnectionBuilder::flow(from, "flow", to))`
    pub fn then(self, from: u32, to: u32) -> Self {
        self.connection(ConnectionBuilder::flow(from, "flow", to))
    }

    pub fn data(self, from: u32, output: &str, to: u32, input: &str) -> Self {
        self.connection(ConnectionBuilder::data(from, output, to, input))
    }

    pub fn build(self) -> GraphModel {
        self.graph
    }

    /// Wrap the graph in a single-scene project named `main`
    pub fn into_project(self) -> Project {
        Project::new().with_scene(SceneId::new("main"), self.graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_builder() {
        let graph = GraphBuilder::new()
            .node(NodeBuilder::new(1, "OnStart"))
            .node(NodeBuilder::new(2, "Move").param("target", "enemy"))
            .then(1, 2)
            .build();

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.connections[0].ty, SocketType::Flow);
        assert_eq!(
            graph.node(NodeId(2)).unwrap().parameters["target"],
            ParamValue::from("enemy")
        );
    }
}
