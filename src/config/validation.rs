//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that TLS material is present when TLS is enabled
//! - Validate value ranges (limits > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("dataset.path is required")]
    MissingDatasetPath,
    #[error("dataset.path does not exist: {0}")]
    DatasetPathNotFound(PathBuf),
    #[error("dataset.path is a directory, not a file: {0}")]
    DatasetPathIsDirectory(PathBuf),
    #[error("listener.bind_address is not a socket address: {0}")]
    InvalidBindAddress(String),
    #[error("listener.use_tls is set but [listener.tls] cert_path/key_path are missing")]
    MissingTlsMaterial,
    #[error("listener.max_connections must be greater than zero")]
    ZeroMaxConnections,
    #[error("rate_limit.requests_per_second must be greater than zero")]
    ZeroRateLimit,
    #[error("limits.max_request_bytes must be greater than zero")]
    ZeroRequestLimit,
    #[error("observability.metrics_address is not a socket address: {0}")]
    InvalidMetricsAddress(String),
    #[error("admin.bind_address is not a socket address: {0}")]
    InvalidAdminAddress(String),
    #[error("admin.api_key must be set when the admin endpoint is enabled")]
    MissingAdminKey,
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let dataset = &config.dataset;
    if dataset.path.as_os_str().is_empty() {
        errors.push(ValidationError::MissingDatasetPath);
    } else if !dataset.path.exists() {
        errors.push(ValidationError::DatasetPathNotFound(dataset.path.clone()));
    } else if dataset.path.is_dir() {
        errors.push(ValidationError::DatasetPathIsDirectory(dataset.path.clone()));
    }

    let listener = &config.listener;
    if listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(listener.bind_address.clone()));
    }
    if listener.use_tls && listener.tls.is_none() {
        errors.push(ValidationError::MissingTlsMaterial);
    }
    if listener.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    }

    if config.rate_limit.enabled && config.rate_limit.requests_per_second == 0 {
        errors.push(ValidationError::ZeroRateLimit);
    }
    if config.limits.max_request_bytes == 0 {
        errors.push(ValidationError::ZeroRequestLimit);
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    let admin = &config.admin;
    if admin.enabled {
        if admin.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidAdminAddress(admin.bind_address.clone()));
        }
        if admin.api_key.trim().is_empty() {
            errors.push(ValidationError::MissingAdminKey);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::TlsConfig;
    use tempfile::NamedTempFile;

    fn config_with_dataset() -> (ServerConfig, NamedTempFile) {
        let file = NamedTempFile::new().unwrap();
        (ServerConfig::for_dataset(file.path()), file)
    }

    #[test]
    fn test_defaults_with_dataset_are_valid() {
        let (config, _file) = config_with_dataset();
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_nonexistent_dataset_path() {
        let mut config = ServerConfig::for_dataset("/srv/data/absent.txt");
        let expected = vec![ValidationError::DatasetPathNotFound("/srv/data/absent.txt".into())];
        assert_eq!(validate_config(&config).unwrap_err(), expected);

        // Per-request reloading does not relax the check.
        config.dataset.reread_on_query = true;
        assert_eq!(validate_config(&config).unwrap_err(), expected);
    }

    #[test]
    fn test_missing_dataset_path() {
        let config = ServerConfig::default();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::MissingDatasetPath]);
    }

    #[test]
    fn test_directory_dataset_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::for_dataset(dir.path());
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::DatasetPathIsDirectory(_)));
    }

    #[test]
    fn test_tls_requires_material() {
        let (mut config, _file) = config_with_dataset();
        config.listener.use_tls = true;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::MissingTlsMaterial]
        );

        config.listener.tls = Some(TlsConfig {
            cert_path: "cert.pem".into(),
            key_path: "key.pem".into(),
        });
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let (mut config, _file) = config_with_dataset();
        config.listener.bind_address = "not-an-address".into();
        config.rate_limit.requests_per_second = 0;
        config.limits.max_request_bytes = 0;
        config.admin.enabled = true;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::ZeroRateLimit));
        assert!(errors.contains(&ValidationError::ZeroRequestLimit));
        assert!(errors.contains(&ValidationError::MissingAdminKey));
    }

    #[test]
    fn test_zero_rate_ignored_when_disabled() {
        let (mut config, _file) = config_with_dataset();
        config.rate_limit.enabled = false;
        config.rate_limit.requests_per_second = 0;
        assert!(validate_config(&config).is_ok());
    }
}
