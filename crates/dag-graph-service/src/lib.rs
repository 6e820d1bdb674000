//! Graph Service - persistence for saved DAG editor graphs
//!
//! Stores [`dag_engine::GraphDocument`]s under UUIDs and exposes:
//!
//! - Paginated listing, most recently updated first
//! - Get / create / update / delete / duplicate
//! - Request validation that reports every problem at once
//! - A TTL cache in front of single-graph reads
//!
//! Storage is pluggable through [`GraphStore`]; an in-memory store and a
//! one-file-per-graph JSON store are provided.
//!
//! # Example
//!
//! ```ignore
//! use dag_graph_service::{GraphService, GraphServiceConfig, InMemoryGraphStore, PageRequest};
//!
//! let service = GraphService::new(InMemoryGraphStore::new(), GraphServiceConfig::default());
//! let stored = service.create(editor.to_document("Pipeline")).await?;
//! let page = service.list(PageRequest::default()).await?;
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod service;
pub mod store;
pub mod validation;

// Re-export key types
pub use cache::{CacheStats, Clock, ManualClock, SystemClock, TtlCache};
pub use config::GraphServiceConfig;
pub use error::{GraphServiceError, Result};
pub use service::{GraphPage, GraphService, PageRequest, Pagination};
pub use store::{FileGraphStore, GraphMetadata, GraphStore, InMemoryGraphStore, StoredGraph};
pub use validation::{validate_document, validate_page_request};
