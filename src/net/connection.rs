//! Connection identity and lifetime tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Count live connections for the status endpoint and metrics gauge

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::observability::metrics;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    active: AtomicU64,
}

/// Tracks live connections.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    state: Arc<TrackerState>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new connection. The returned guard releases it on drop.
    pub fn track(&self) -> ConnectionGuard {
        let active = self.state.active.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::record_active_connections(active);
        ConnectionGuard {
            state: Arc::clone(&self.state),
            id: ConnectionId::new(),
        }
    }

    pub fn active_count(&self) -> u64 {
        self.state.active.load(Ordering::SeqCst)
    }
}

/// Guard that tracks a connection's lifetime.
#[derive(Debug)]
pub struct ConnectionGuard {
    state: Arc<TrackerState>,
    id: ConnectionId,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let remaining = self.state.active.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::record_active_connections(remaining);
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}
