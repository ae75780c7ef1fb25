//! Query execution subsystem.
//!
//! # Data Flow
//! ```text
//! sanitized query + Arc<Dataset> snapshot
//!     → executor.rs (permit, blocking worker, exact match)
//!     → MatchResult
//! ```
//!
//! # Design Decisions
//! - Matching never runs on the connection scheduler
//! - The dataset is shared by reference, never copied per request

pub mod executor;

pub use executor::{ExecutorError, MatchResult, QueryExecutor};
