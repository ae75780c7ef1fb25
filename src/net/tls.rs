//! TLS configuration and certificate loading.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::crypto::ring;
use rustls::ServerConfig;
use thiserror::Error;
use tokio_rustls::TlsAcceptor;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("Certificate file not found: {0}")]
    CertificateNotFound(PathBuf),
    #[error("Private key file not found: {0}")]
    KeyNotFound(PathBuf),
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No certificates in {0}")]
    NoCertificates(PathBuf),
    #[error("No private key in {0}")]
    NoPrivateKey(PathBuf),
    #[error("Invalid TLS material: {0}")]
    Rustls(#[from] rustls::Error),
}

/// Build a server-authentication acceptor from PEM certificate chain and key.
///
/// Client certificates are not requested.
pub fn load_tls_acceptor(cert_path: &Path, key_path: &Path) -> Result<TlsAcceptor, TlsError> {
    if !cert_path.exists() {
        return Err(TlsError::CertificateNotFound(cert_path.to_path_buf()));
    }
    if !key_path.exists() {
        return Err(TlsError::KeyNotFound(key_path.to_path_buf()));
    }

    let read_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source| TlsError::Read { path, source }
    };

    let cert_file = File::open(cert_path).map_err(read_error(cert_path))?;
    let cert_chain = rustls_pemfile::certs(&mut BufReader::new(cert_file))
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_error(cert_path))?;
    if cert_chain.is_empty() {
        return Err(TlsError::NoCertificates(cert_path.to_path_buf()));
    }

    let key_file = File::open(key_path).map_err(read_error(key_path))?;
    let key = rustls_pemfile::private_key(&mut BufReader::new(key_file))
        .map_err(read_error(key_path))?
        .ok_or_else(|| TlsError::NoPrivateKey(key_path.to_path_buf()))?;

    let config = ServerConfig::builder_with_provider(Arc::new(ring::default_provider()))
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(cert_chain, key)?;

    tracing::info!(cert = %cert_path.display(), "TLS configured");
    Ok(TlsAcceptor::from(Arc::new(config)))
}
