//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use linematch::lifecycle::StartupError;
use linematch::observability::metrics::MetricsSnapshot;
use linematch::{LineServer, ServerConfig};
use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

/// A server bound to an ephemeral port, serving a temporary reference file.
pub struct TestServer {
    pub server: Arc<LineServer>,
    pub addr: SocketAddr,
    pub dataset: NamedTempFile,
    pub handle: JoinHandle<Result<(), StartupError>>,
}

impl TestServer {
    /// Shut down and return the final counters once every connection has finished.
    pub async fn stop(self) -> MetricsSnapshot {
        self.server.shutdown().await;
        self.handle.await.unwrap().unwrap();
        self.server.metrics()
    }
}

/// Write `content` to a fresh temporary file.
pub fn reference_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Config for a local test server: ephemeral port, limits raised out of the way.
pub fn test_config(dataset: &NamedTempFile) -> ServerConfig {
    let mut config = ServerConfig::for_dataset(dataset.path());
    config.listener.bind_address = "127.0.0.1:0".into();
    config.rate_limit.enabled = false;
    config.lifecycle.shutdown_grace_secs = 1;
    config
}

pub async fn start_server(content: &str) -> TestServer {
    start_server_with(content, |_| {}).await
}

/// Start a server after letting `configure` adjust the test config.
pub async fn start_server_with<F>(content: &str, configure: F) -> TestServer
where
    F: FnOnce(&mut ServerConfig),
{
    let dataset = reference_file(content);
    let mut config = test_config(&dataset);
    configure(&mut config);

    let server = Arc::new(LineServer::new(config).unwrap());
    let runner = Arc::clone(&server);
    let handle = tokio::spawn(async move { runner.start().await });

    let addr = server.listening().await.expect("server failed to start");
    TestServer {
        server,
        addr,
        dataset,
        handle,
    }
}

/// Send `payload` over plain TCP and read the single response line.
///
/// A rejection can be sent before the server reads the payload, so the close
/// may arrive as a reset after the response; whatever was received is returned.
pub async fn query(addr: SocketAddr, payload: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let _ = stream.write_all(payload).await;

    let mut response = Vec::new();
    let _ = stream.read_to_end(&mut response).await;
    String::from_utf8_lossy(&response).into_owned()
}
