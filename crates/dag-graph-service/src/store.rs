//! Storage backends for saved graphs
//!
//! The service only needs keyed get/put/remove plus a full listing; ordering
//! and pagination happen above the store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dag_engine::GraphDocument;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// Counters kept alongside a stored graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetadata {
    pub node_count: usize,
    pub edge_count: usize,
}

impl GraphMetadata {
    pub fn of(document: &GraphDocument) -> Self {
        Self {
            node_count: document.nodes.len(),
            edge_count: document.edges.len(),
        }
    }
}

/// A persisted graph record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredGraph {
    pub id: Uuid,
    pub document: GraphDocument,
    pub metadata: GraphMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredGraph {
    /// Wrap a document in a fresh record
    pub fn new(document: GraphDocument) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            metadata: GraphMetadata::of(&document),
            document,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the document, keeping id and creation time
    pub fn revise(mut self, document: GraphDocument) -> Self {
        self.metadata = GraphMetadata::of(&document);
        self.document = document;
        self.updated_at = Utc::now();
        self
    }
}

/// Keyed persistence for graph records
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Every stored graph, in no particular order
    async fn list(&self) -> Result<Vec<StoredGraph>>;

    async fn get(&self, id: Uuid) -> Result<Option<StoredGraph>>;

    /// Insert or replace the record with the same id
    async fn put(&self, graph: StoredGraph) -> Result<()>;

    /// Remove a record; returns whether it existed
    async fn remove(&self, id: Uuid) -> Result<bool>;
}

/// Process-local store, mostly for tests and embedding
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    graphs: RwLock<HashMap<Uuid, StoredGraph>>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn list(&self) -> Result<Vec<StoredGraph>> {
        Ok(self.graphs.read().values().cloned().collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredGraph>> {
        Ok(self.graphs.read().get(&id).cloned())
    }

    async fn put(&self, graph: StoredGraph) -> Result<()> {
        self.graphs.write().insert(graph.id, graph);
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<bool> {
        Ok(self.graphs.write().remove(&id).is_some())
    }
}

/// One pretty-printed JSON file per graph, named `{id}.json`
#[derive(Debug, Clone)]
pub struct FileGraphStore {
    root: PathBuf,
}

impl FileGraphStore {
    /// Store rooted at `root`; the directory is created on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }
}

#[async_trait]
impl GraphStore for FileGraphStore {
    async fn list(&self) -> Result<Vec<StoredGraph>> {
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut graphs = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let contents = tokio::fs::read_to_string(&path).await?;
            match serde_json::from_str::<StoredGraph>(&contents) {
                Ok(graph) => graphs.push(graph),
                Err(e) => log::warn!("Skipping unreadable graph file {:?}: {}", path, e),
            }
        }
        Ok(graphs)
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredGraph>> {
        match tokio::fs::read_to_string(self.path_for(id)).await {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, graph: StoredGraph) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        let json = serde_json::to_string_pretty(&graph)?;
        tokio::fs::write(self.path_for(graph.id), json).await?;
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<bool> {
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
