//! Error types for the graph service

use thiserror::Error;

/// Result type alias using GraphServiceError
pub type Result<T> = std::result::Result<T, GraphServiceError>;

/// Errors returned by stores and the service
#[derive(Debug, Error)]
pub enum GraphServiceError {
    /// The id is not a well-formed UUID
    #[error("Invalid graph ID format: {0}")]
    InvalidId(String),

    /// No graph is stored under the id
    #[error("Graph not found: {0}")]
    NotFound(String),

    /// The submitted document failed validation
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GraphServiceError {
    /// Create a not-found error
    pub fn not_found(id: impl ToString) -> Self {
        Self::NotFound(id.to_string())
    }
}
