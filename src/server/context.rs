//! Shared server state.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::dataset::ContentStore;
use crate::net::ConnectionTracker;
use crate::observability::metrics::ServerMetrics;
use crate::query::QueryExecutor;
use crate::security::RateLimiter;

/// State shared by every connection handler.
///
/// One instance per server, passed to handlers as `Arc<ServerContext>`;
/// each field synchronizes itself.
#[derive(Debug)]
pub struct ServerContext {
    pub config: Arc<ServerConfig>,
    pub store: ContentStore,
    pub limiter: RateLimiter,
    pub executor: QueryExecutor,
    pub metrics: ServerMetrics,
    pub connections: ConnectionTracker,
}

impl ServerContext {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            store: ContentStore::new(config.dataset.path.clone()),
            limiter: RateLimiter::new(&config.rate_limit),
            executor: QueryExecutor::new(config.executor.workers),
            metrics: ServerMetrics::new(),
            connections: ConnectionTracker::new(),
            config: Arc::new(config),
        }
    }
}
