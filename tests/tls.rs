//! TLS round trips with the fixture certificates.

mod common;

use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use common::{query, start_server_with, TestServer};
use linematch::config::TlsConfig;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn connector() -> TlsConnector {
    let mut roots = RootCertStore::empty();
    let mut reader = BufReader::new(File::open(fixture("ca.pem")).unwrap());
    for cert in rustls_pemfile::certs(&mut reader) {
        roots.add(cert.unwrap()).unwrap();
    }

    let config = ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .unwrap()
    .with_root_certificates(roots)
    .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}

async fn tls_query(addr: SocketAddr, payload: &[u8]) -> String {
    let stream = TcpStream::connect(addr).await.unwrap();
    let name = ServerName::try_from("localhost").unwrap();
    let mut stream = connector().connect(name, stream).await.unwrap();
    stream.write_all(payload).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

async fn start_tls_server(content: &str) -> TestServer {
    start_server_with(content, |c| {
        c.listener.use_tls = true;
        c.listener.tls = Some(TlsConfig {
            cert_path: fixture("server.pem"),
            key_path: fixture("server.key"),
        });
    })
    .await
}

#[tokio::test]
async fn test_tls_round_trip() {
    let server = start_tls_server("line1\nexact_line\n").await;

    assert_eq!(
        tls_query(server.addr, b"exact_line").await,
        "Query 'exact_line' EXISTS\n"
    );
    assert_eq!(tls_query(server.addr, b"line9").await, "Query 'line9' NOT FOUND\n");

    let metrics = server.stop().await;
    assert_eq!(metrics.successful_requests, 2);
}

#[tokio::test]
async fn test_plaintext_client_does_not_break_tls_server() {
    let server = start_tls_server("exact_line\n").await;

    // The handshake fails and the socket is dropped without a response line.
    let response = query(server.addr, b"exact_line").await;
    assert!(!response.contains("EXISTS"));

    assert_eq!(
        tls_query(server.addr, b"exact_line").await,
        "Query 'exact_line' EXISTS\n"
    );

    server.stop().await;
}
