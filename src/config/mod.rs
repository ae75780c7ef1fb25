//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, deserialize, apply LINEMATCH_* overrides)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - Only `[dataset]` is mandatory, every other section has defaults
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, DatasetConfig, ExecutorConfig, LifecycleConfig, LimitsConfig, ListenerConfig,
    ObservabilityConfig, RateLimitConfig, ServerConfig, TlsConfig,
};
pub use validation::{validate_config, ValidationError};
