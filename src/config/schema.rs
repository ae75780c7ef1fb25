//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.
//! Every section except `[dataset]` may be omitted.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the line-matching server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, TLS).
    #[serde(default)]
    pub listener: ListenerConfig,

    /// Reference dataset location and reload policy.
    pub dataset: DatasetConfig,

    /// Per-address admission control.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Request size limits.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Query worker pool sizing.
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Start/stop sequencing.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// Observability settings.
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Operator status endpoint.
    #[serde(default)]
    pub admin: AdminConfig,
}

impl ServerConfig {
    /// Defaults for every section, serving `path` in load-once mode.
    pub fn for_dataset(path: impl Into<PathBuf>) -> Self {
        Self {
            dataset: DatasetConfig {
                path: path.into(),
                reread_on_query: false,
            },
            ..Self::default()
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:44445").
    pub bind_address: String,

    /// Serve connections over TLS.
    pub use_tls: bool,

    /// Certificate material, required when `use_tls` is set.
    pub tls: Option<TlsConfig>,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:44445".to_string(),
            use_tls: false,
            tls: None,
            max_connections: 10_000,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate chain file (PEM).
    pub cert_path: PathBuf,

    /// Path to private key file (PEM).
    pub key_path: PathBuf,
}

/// Reference dataset configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DatasetConfig {
    /// Reference file path. May be supplied by `LINEMATCH_DATASET_PATH` instead.
    #[serde(default)]
    pub path: PathBuf,

    /// Reload the file on every query instead of caching it at startup.
    pub reread_on_query: bool,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Maximum accepted requests per address in any trailing second.
    pub requests_per_second: u32,

    /// Upper bound on tracked addresses; the least recently seen is evicted
    /// first. Zero disables the bound.
    pub max_tracked_addresses: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: 10,
            max_tracked_addresses: 100_000,
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest query payload accepted in a single read, in bytes.
    pub max_request_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_request_bytes: 1024,
        }
    }
}

/// Query worker pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Number of concurrent lookups; 0 means available parallelism.
    pub workers: usize,
}

/// Start/stop sequencing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// How long shutdown waits for in-flight connections before closing them.
    pub shutdown_grace_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Optional log file, written in addition to stdout.
    pub log_file: Option<PathBuf>,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Exporter bind address.
    pub metrics_address: String,

    /// Interval between aggregated metrics log lines, in seconds.
    pub report_interval_secs: u64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
            report_interval_secs: 60,
        }
    }
}

/// Admin status endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin endpoint.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin endpoint bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
