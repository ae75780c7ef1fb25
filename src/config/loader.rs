//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::{ServerConfig, TlsConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Overrides the reference file path.
pub const ENV_DATASET_PATH: &str = "LINEMATCH_DATASET_PATH";
/// Overrides the TLS certificate chain path.
pub const ENV_TLS_CERT: &str = "LINEMATCH_TLS_CERT";
/// Overrides the TLS private key path.
pub const ENV_TLS_KEY: &str = "LINEMATCH_TLS_KEY";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file, honouring the
/// `LINEMATCH_*` environment overrides.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content, |key| std::env::var(key).ok())
}

/// Parse configuration text, apply overrides from `env`, then validate.
pub fn parse_config<F>(content: &str, env: F) -> Result<ServerConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: ServerConfig = toml::from_str(content)?;
    apply_env_overrides(&mut config, env);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn apply_env_overrides<F>(config: &mut ServerConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = env(ENV_DATASET_PATH).filter(|p| !p.is_empty()) {
        config.dataset.path = PathBuf::from(path);
    }

    let cert = env(ENV_TLS_CERT).filter(|p| !p.is_empty());
    let key = env(ENV_TLS_KEY).filter(|p| !p.is_empty());
    match (&mut config.listener.tls, cert, key) {
        (Some(tls), cert, key) => {
            if let Some(cert) = cert {
                tls.cert_path = cert.into();
            }
            if let Some(key) = key {
                tls.key_path = key.into();
            }
        }
        (None, Some(cert), Some(key)) => {
            config.listener.tls = Some(TlsConfig {
                cert_path: cert.into(),
                key_path: key.into(),
            });
        }
        _ => {}
    }
}
