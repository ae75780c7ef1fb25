//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, stdout + optional file)
//!     → metrics.rs (request counters, dataset gauges, query latency)
//!
//! Consumers:
//!     → Log aggregation (stdout, file)
//!     → Periodic and final metrics summaries in the log
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;
