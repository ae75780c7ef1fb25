//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Aggregate process-wide request counters for periodic and final log lines
//! - Mirror the same events through the `metrics` facade
//! - Expose a Prometheus-compatible endpoint when enabled
//!
//! # Metrics
//! - `linematch_requests_total` (counter): requests by outcome
//! - `linematch_dataset_reloads_total` (counter): reloads by outcome
//! - `linematch_dataset_lines` (gauge): lines in the published dataset
//! - `linematch_active_connections` (gauge): current connection count
//! - `linematch_query_duration_seconds` (histogram): lookup latency
//!
//! # Design Decisions
//! - Counters are plain atomics; `Relaxed` is enough since no cross-field
//!   ordering is required
//! - Facade calls are no-ops until an exporter is installed

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use serde::Serialize;

/// Client-facing rejection categories. None of them count as failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    RateLimited,
    Oversized,
    InvalidQuery,
}

impl RejectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionKind::RateLimited => "rate_limited",
            RejectionKind::Oversized => "oversized",
            RejectionKind::InvalidQuery => "invalid_query",
        }
    }
}

/// Monotonic request counters shared by every connection.
#[derive(Debug, Default)]
pub struct ServerMetrics {
    total: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
    rate_limited: AtomicU64,
    oversized: AtomicU64,
    invalid: AtomicU64,
}

/// Point-in-time copy of [`ServerMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub rate_limited: u64,
    pub oversized: u64,
    pub invalid_queries: u64,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// An admitted request entered processing.
    pub fn record_request(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.successful.fetch_add(1, Ordering::Relaxed);
        record_outcome("success");
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        record_outcome("error");
    }

    pub fn record_rejection(&self, kind: RejectionKind) {
        let counter = match kind {
            RejectionKind::RateLimited => &self.rate_limited,
            RejectionKind::Oversized => &self.oversized,
            RejectionKind::InvalidQuery => &self.invalid,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        record_outcome(kind.as_str());
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total.load(Ordering::Relaxed),
            successful_requests: self.successful.load(Ordering::Relaxed),
            failed_requests: self.failed.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            oversized: self.oversized.load(Ordering::Relaxed),
            invalid_queries: self.invalid.load(Ordering::Relaxed),
        }
    }

    /// Emit the aggregated counters as one structured log line.
    pub fn log_summary(&self, label: &'static str) {
        let s = self.snapshot();
        tracing::info!(
            total_requests = s.total_requests,
            successful_requests = s.successful_requests,
            failed_requests = s.failed_requests,
            rate_limited = s.rate_limited,
            oversized = s.oversized,
            invalid_queries = s.invalid_queries,
            "{label}"
        );
    }
}

/// Install the Prometheus exporter on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

fn record_outcome(outcome: &'static str) {
    ::metrics::counter!("linematch_requests_total", "outcome" => outcome).increment(1);
}

pub fn record_dataset_reload(outcome: &'static str) {
    ::metrics::counter!("linematch_dataset_reloads_total", "outcome" => outcome).increment(1);
}

pub fn record_dataset_lines(lines: usize) {
    ::metrics::gauge!("linematch_dataset_lines").set(lines as f64);
}

pub fn record_active_connections(count: u64) {
    ::metrics::gauge!("linematch_active_connections").set(count as f64);
}

pub fn record_query_duration(start: Instant) {
    ::metrics::histogram!("linematch_query_duration_seconds").record(start.elapsed().as_secs_f64());
}
