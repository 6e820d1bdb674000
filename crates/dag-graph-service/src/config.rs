//! Graph service configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default cache lifetime for fetched graphs
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

/// Page size used when a listing request omits one
pub const DEFAULT_PAGE_LIMIT: usize = 10;

/// Largest page size a listing request may ask for
pub const MAX_PAGE_LIMIT: usize = 100;

/// Tunables for [`crate::GraphService`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphServiceConfig {
    /// Seconds a fetched graph stays in the cache
    pub cache_ttl_secs: u64,
    /// Page size when none is requested
    pub default_page_limit: usize,
    /// Upper bound on requested page size
    pub max_page_limit: usize,
}

impl Default for GraphServiceConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            default_page_limit: DEFAULT_PAGE_LIMIT,
            max_page_limit: MAX_PAGE_LIMIT,
        }
    }
}

impl GraphServiceConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
