//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Accepted connection:
//!     → rate_limit.rs (per-IP sliding window, before anything is read)
//!     → [request read with size cap]
//!     → sanitize.rs (trim, strip shell metacharacters)
//!     → Pass to lookup
//! ```
//!
//! # Design Decisions
//! - Admission happens before any other per-request work
//! - Fail closed: reject on any check failure
//! - No trust in client input, even though no shell is ever invoked

pub mod rate_limit;
pub mod sanitize;

pub use rate_limit::RateLimiter;
pub use sanitize::sanitize_query;
