//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the dataset up front when it is cached for the process lifetime
//! - Build the TLS acceptor when TLS is enabled
//! - Bind the listener last, so traffic arrives only when ready
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Steps run in order, not concurrently

use thiserror::Error;
use tokio_rustls::TlsAcceptor;

use crate::config::{ConfigError, ValidationError};
use crate::dataset::FileError;
use crate::net::{load_tls_acceptor, Listener, ListenerError, TlsError};
use crate::server::ServerContext;

/// Errors that prevent the server from serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
    #[error("Initial dataset load failed: {0}")]
    Dataset(#[from] FileError),
    #[error("TLS setup failed: {0}")]
    Tls(#[from] TlsError),
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error("Server was already started")]
    AlreadyStarted,
}

/// Everything `serve` needs once startup has succeeded.
pub struct Prepared {
    pub listener: Listener,
    pub tls: Option<TlsAcceptor>,
}

/// Run the ordered startup steps against a freshly built context.
pub async fn prepare(ctx: &ServerContext) -> Result<Prepared, StartupError> {
    let config = &ctx.config;

    if config.dataset.reread_on_query {
        tracing::info!(
            path = %config.dataset.path.display(),
            "reread_on_query enabled, dataset is loaded per request"
        );
    } else {
        tracing::info!(path = %config.dataset.path.display(), "Loading dataset at startup");
        let dataset = ctx.store.reload().await?;
        tracing::info!(lines = dataset.len(), "Dataset loaded");
    }

    let tls = if config.listener.use_tls {
        let material = config.listener.tls.as_ref().ok_or_else(|| {
            ConfigError::Validation(vec![ValidationError::MissingTlsMaterial])
        })?;
        Some(load_tls_acceptor(&material.cert_path, &material.key_path)?)
    } else {
        tracing::info!("Starting without TLS");
        None
    };

    let listener = Listener::bind(&config.listener).await?;

    Ok(Prepared { listener, tls })
}
