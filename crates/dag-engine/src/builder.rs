//! Fluent builder for graphs
//!
//! Provides a compact API for constructing graphs programmatically, mostly
//! used by tests and by callers seeding an editor.

use crate::types::{GraphDocument, GraphEdge, GraphNode, GraphSnapshot, Position};

/// Fluent builder for node/edge sets
///
/// # Example
///
/// ```
/// use dag_engine::GraphBuilder;
///
/// let graph = GraphBuilder::new()
///     .add_node("1", "Start Node", (250.0, 25.0))
///     .add_node("2", "Process A", (100.0, 125.0))
///     .connect("1", "2")
///     .build();
///
/// assert_eq!(graph.edges[0].id, "e1-2");
/// ```
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
}

impl GraphBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the graph
    pub fn add_node(
        mut self,
        id: impl Into<String>,
        label: impl Into<String>,
        position: (f64, f64),
    ) -> Self {
        self.nodes.push(GraphNode::new(
            id,
            label,
            Position::new(position.0, position.1),
        ));
        self
    }

    /// Mark the most recently added node as selected
    ///
    /// Must be called immediately after `add_node`.
    pub fn selected(mut self) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.selected = true;
        }
        self
    }

    /// Add an edge with the conventional `e{source}-{target}` id
    pub fn connect(self, source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        let id = GraphEdge::conventional_id(&source, &target);
        self.add_edge_with_id(id, source, target)
    }

    /// Add an edge with an explicit ID
    pub fn add_edge_with_id(
        mut self,
        edge_id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.edges.push(GraphEdge::new(edge_id, source, target));
        self
    }

    /// Build the graph without validation
    pub fn build(self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes,
            edges: self.edges,
        }
    }

    /// Build a persisted document with the given name
    pub fn build_document(self, name: impl Into<String>) -> GraphDocument {
        GraphDocument::new(name).with_graph(self.nodes, self.edges)
    }
}
