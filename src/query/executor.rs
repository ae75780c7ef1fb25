//! Bounded worker pool for lookups.
//!
//! # Responsibilities
//! - Run matching on Tokio's blocking pool, off the connection scheduler
//! - Bound concurrent lookups to the configured worker count
//! - Drain in-flight lookups on shutdown and refuse new ones
//!
//! # Design Decisions
//! - A semaphore sized to the worker count gates submissions; each permit is
//!   held until the lookup result has been received
//! - Shutdown acquires every permit, so it completes only once all in-flight
//!   lookups have returned, then closes the semaphore
//! - No timeout: a stalled lookup stalls only its own connection

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::Semaphore;

use crate::dataset::Dataset;
use crate::observability::metrics;

/// Outcome of a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    Exists,
    NotFound,
}

impl From<bool> for MatchResult {
    fn from(found: bool) -> Self {
        if found {
            MatchResult::Exists
        } else {
            MatchResult::NotFound
        }
    }
}

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("query executor is shut down")]
    ShutDown,
    #[error("query worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Long-lived pool executing exact-match lookups.
#[derive(Debug)]
pub struct QueryExecutor {
    permits: Arc<Semaphore>,
    workers: usize,
    closed: AtomicBool,
}

impl QueryExecutor {
    /// Create a pool with `workers` slots; 0 selects the available parallelism.
    pub fn new(workers: usize) -> Self {
        let workers = if workers == 0 {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        } else {
            workers
        };

        Self {
            permits: Arc::new(Semaphore::new(workers)),
            workers,
            closed: AtomicBool::new(false),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Lookups currently running.
    pub fn in_flight(&self) -> usize {
        if self.permits.is_closed() {
            return 0;
        }
        self.workers - self.permits.available_permits()
    }

    /// Look `query` up in `dataset` on a worker.
    pub async fn execute(
        &self,
        query: String,
        dataset: Arc<Dataset>,
    ) -> Result<MatchResult, ExecutorError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ExecutorError::ShutDown);
        }

        let _permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| ExecutorError::ShutDown)?;

        let start = Instant::now();
        let found = tokio::task::spawn_blocking(move || dataset.contains(&query)).await?;
        metrics::record_query_duration(start);

        Ok(found.into())
    }

    /// Refuse new lookups and wait for running ones to finish. Idempotent.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let all = u32::try_from(self.workers).unwrap_or(u32::MAX);
        if let Ok(permits) = self.permits.acquire_many(all).await {
            permits.forget();
        }
        self.permits.close();
        tracing::info!(workers = self.workers, "Query executor drained");
    }
}
