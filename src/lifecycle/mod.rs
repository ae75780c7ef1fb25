//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate config → Load dataset (load-once mode) → TLS → Bind
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Stop accepting → Drain connections → Drain executor
//!     → Release dataset → Log final metrics
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → caller triggers shutdown
//! ```
//!
//! # Phases
//! `Created → Loading → Listening → ShuttingDown → Stopped`

pub mod shutdown;
pub mod signals;
pub mod startup;

use serde::Serialize;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::StartupError;

/// Where a server is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Created,
    Loading,
    Listening,
    ShuttingDown,
    Stopped,
}
