//! Graph service
//!
//! CRUD, listing and duplication over a [`GraphStore`], with request
//! validation and a TTL cache in front of single-graph reads.

use std::sync::Arc;

use dag_engine::GraphDocument;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::{CacheStats, Clock, SystemClock, TtlCache};
use crate::config::GraphServiceConfig;
use crate::error::{GraphServiceError, Result};
use crate::store::{GraphStore, StoredGraph};
use crate::validation::{validate_document, validate_page_request};

/// Listing request; `limit` falls back to the configured default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRequest {
    pub page: usize,
    pub limit: Option<usize>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: None,
        }
    }
}

impl PageRequest {
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page,
            limit: Some(limit),
        }
    }

    /// Requested page size, or the service default
    pub fn effective_limit(&self, config: &GraphServiceConfig) -> usize {
        self.limit.unwrap_or(config.default_page_limit)
    }
}

/// Position of a page within the full listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
}

/// One page of graphs, most recently updated first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphPage {
    pub graphs: Vec<StoredGraph>,
    pub pagination: Pagination,
}

/// Validated, cached access to stored graphs
pub struct GraphService<S: GraphStore> {
    store: S,
    cache: TtlCache<StoredGraph>,
    config: GraphServiceConfig,
}

impl<S: GraphStore> GraphService<S> {
    pub fn new(store: S, config: GraphServiceConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Service whose cache reads time from `clock`
    pub fn with_clock(store: S, config: GraphServiceConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache: TtlCache::with_clock(config.cache_ttl(), clock),
            store,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &GraphServiceConfig {
        &self.config
    }

    /// List graphs newest-update first
    pub async fn list(&self, request: PageRequest) -> Result<GraphPage> {
        validate_page_request(&request, &self.config)?;
        let limit = request.effective_limit(&self.config);

        let mut graphs = self.store.list().await?;
        graphs.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });

        let total = graphs.len();
        let skip = (request.page - 1).saturating_mul(limit);
        let graphs = graphs.into_iter().skip(skip).take(limit).collect();

        Ok(GraphPage {
            graphs,
            pagination: Pagination {
                page: request.page,
                limit,
                total,
                pages: total.div_ceil(limit),
            },
        })
    }

    /// Fetch one graph, served from cache while fresh
    pub async fn get(&self, id: &str) -> Result<StoredGraph> {
        let id = parse_id(id)?;
        let key = cache_key(id);

        if let Some(graph) = self.cache.get(&key) {
            log::debug!("Cache hit for graph {}", id);
            return Ok(graph);
        }

        let graph = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| GraphServiceError::not_found(id))?;
        self.cache.set(key, graph.clone());
        Ok(graph)
    }

    /// Validate and store a new graph
    pub async fn create(&self, document: GraphDocument) -> Result<StoredGraph> {
        validate_document(&document)?;
        let graph = StoredGraph::new(document);
        self.store.put(graph.clone()).await?;
        log::info!("Created graph {} ({:?})", graph.id, graph.document.name);
        Ok(graph)
    }

    /// Replace a graph's document
    pub async fn update(&self, id: &str, document: GraphDocument) -> Result<StoredGraph> {
        let id = parse_id(id)?;
        validate_document(&document)?;

        let existing = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| GraphServiceError::not_found(id))?;
        let graph = existing.revise(document);
        self.store.put(graph.clone()).await?;
        self.cache.delete(&cache_key(id));
        log::info!("Updated graph {}", id);
        Ok(graph)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let id = parse_id(id)?;
        if !self.store.remove(id).await? {
            return Err(GraphServiceError::not_found(id));
        }
        self.cache.delete(&cache_key(id));
        log::info!("Deleted graph {}", id);
        Ok(())
    }

    /// Store a copy named `"{name} (Copy)"` under a new id
    pub async fn duplicate(&self, id: &str) -> Result<StoredGraph> {
        let original = self.get(id).await?;
        let mut document = original.document;
        document.name = format!("{} (Copy)", document.name);

        let graph = StoredGraph::new(document);
        self.store.put(graph.clone()).await?;
        log::info!("Duplicated graph {} as {}", original.id, graph.id);
        Ok(graph)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Evict expired cache entries
    pub fn purge_cache(&self) -> usize {
        self.cache.purge_expired()
    }
}

fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| GraphServiceError::InvalidId(id.to_string()))
}

fn cache_key(id: Uuid) -> String {
    format!("graph:{}", id)
}
