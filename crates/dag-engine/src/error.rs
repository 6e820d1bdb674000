//! Error types for the DAG engine

use thiserror::Error;

/// Result type alias using DagEngineError
pub type Result<T> = std::result::Result<T, DagEngineError>;

/// Errors that can occur in the DAG engine
///
/// Rejected connections and structural problems are not errors; they are
/// reported as data through `ConnectOutcome` and `ValidationResult`.
#[derive(Debug, Error)]
pub enum DagEngineError {
    /// No node with the given id exists in the graph
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// No edge with the given id exists in the graph
    #[error("Edge not found: {0}")]
    EdgeNotFound(String),

    /// The operation needs at least one node
    #[error("Graph is empty")]
    EmptyGraph,

    /// Every numeric node id is already taken
    #[error("No free node id left")]
    NodeIdsExhausted,

    /// The operation requires an acyclic graph
    #[error("Graph contains a cycle: {0}")]
    CyclicGraph(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compression error
    #[error("Compression error: {0}")]
    Compression(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DagEngineError {
    /// Create a node-not-found error
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound(id.into())
    }

    /// Create an edge-not-found error
    pub fn edge_not_found(id: impl Into<String>) -> Self {
        Self::EdgeNotFound(id.into())
    }
}
