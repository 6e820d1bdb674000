//! Core types for editable DAGs
//!
//! These types define the node/edge data contract shared by the validation,
//! layout and history engines. The JSON shape matches the persisted graph
//! document so loads and saves round-trip without loss.

use serde::{Deserialize, Serialize};

use crate::constants::defaults;

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for an edge
pub type EdgeId = String;

/// A point on the canvas
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Create a position from coordinates
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Return this position shifted by the given deltas
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Side of a node where connections attach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleSide {
    Top,
    Bottom,
    Left,
    Right,
}

/// Node payload. Deliberately plain data: label edits go through the editor
/// by node id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// Human-readable label
    pub label: String,
}

/// A node in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// Unique, stable identifier
    pub id: NodeId,
    /// Renderer type tag
    #[serde(rename = "type", default = "default_node_type")]
    pub node_type: String,
    /// Top-left corner on the canvas
    pub position: Position,
    /// Node payload
    pub data: NodeData,
    /// Whether the node is selected in the editor
    #[serde(default)]
    pub selected: bool,
    /// Side receiving outgoing connections (set by the layout engine)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_position: Option<HandleSide>,
    /// Side receiving incoming connections (set by the layout engine)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_position: Option<HandleSide>,
}

fn default_node_type() -> String {
    defaults::NODE_TYPE.to_string()
}

impl GraphNode {
    /// Create an unselected node with the default type
    pub fn new(id: impl Into<String>, label: impl Into<String>, position: Position) -> Self {
        Self {
            id: id.into(),
            node_type: default_node_type(),
            position,
            data: NodeData {
                label: label.into(),
            },
            selected: false,
            source_position: None,
            target_position: None,
        }
    }

    /// Label used in diagnostics, falling back to the id when the label is blank
    pub fn display_label(&self) -> &str {
        if self.data.label.is_empty() {
            &self.id
        } else {
            &self.data.label
        }
    }
}

/// A directed edge between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    /// Unique identifier for this edge
    pub id: EdgeId,
    /// Source node ID
    pub source: NodeId,
    /// Target node ID
    pub target: NodeId,
    /// Whether the edge is selected in the editor
    #[serde(default)]
    pub selected: bool,
}

impl GraphEdge {
    /// Create an unselected edge
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            selected: false,
        }
    }

    /// Conventional id for an edge between two nodes
    pub fn conventional_id(source: &str, target: &str) -> EdgeId {
        format!("e{}-{}", source, target)
    }

    /// Whether this edge touches the given node
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// Immutable capture of the full node/edge state at one instant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphSnapshot {
    /// Capture a snapshot by copying the given slices
    pub fn capture(nodes: &[GraphNode], edges: &[GraphEdge]) -> Self {
        Self {
            nodes: nodes.to_vec(),
            edges: edges.to_vec(),
        }
    }
}

/// Persisted graph document exchanged with the graph service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    /// Human-readable name
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Nodes in the graph
    pub nodes: Vec<GraphNode>,
    /// Edges connecting nodes
    pub edges: Vec<GraphEdge>,
    /// Search tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Whether other users may read the graph
    #[serde(default)]
    pub is_public: bool,
}

impl GraphDocument {
    /// Create an empty private document
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            tags: Vec::new(),
            is_public: false,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the graph contents
    pub fn with_graph(mut self, nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        self.nodes = nodes;
        self.edges = edges;
        self
    }

    /// Set the tags
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Find a node by ID
pub fn find_node<'a>(nodes: &'a [GraphNode], id: &str) -> Option<&'a GraphNode> {
    nodes.iter().find(|n| n.id == id)
}

/// Display label for a node id, falling back to the id for unknown nodes
pub fn label_of<'a>(nodes: &'a [GraphNode], id: &'a str) -> &'a str {
    find_node(nodes, id).map_or(id, GraphNode::display_label)
}
