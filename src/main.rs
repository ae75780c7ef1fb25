//! linematch server
//!
//! ```text
//!     Client ──TCP/TLS──▶ Listener ──▶ Connection task
//!                                        │
//!                      RateLimiter ◀─────┤ admit(peer ip)
//!                                        │ read + sanitize
//!                     ContentStore ◀─────┤ current() / reload()
//!                    QueryExecutor ◀─────┤ execute(query, dataset)
//!                                        ▼
//!     Client ◀──────── one response line, then close
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use linematch::config::load_config;
use linematch::lifecycle::signals::wait_for_termination;
use linematch::observability::{logging::init_logging, metrics::init_metrics};
use linematch::LineServer;

#[derive(Parser)]
#[command(name = "linematch")]
#[command(about = "Answers whether a query is a complete line of a reference file", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "LINEMATCH_CONFIG", default_value = "linematch.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "linematch starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        use_tls = config.listener.use_tls,
        dataset = %config.dataset.path.display(),
        reread_on_query = config.dataset.reread_on_query,
        max_connections = config.listener.max_connections,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        init_metrics(addr)?;
        tracing::info!(address = %addr, "Prometheus exporter listening");
    }

    let server = Arc::new(LineServer::new(config)?);

    let signal_server = Arc::clone(&server);
    tokio::spawn(async move {
        if let Err(e) = wait_for_termination().await {
            tracing::error!(error = %e, "Failed to listen for signals");
        }
        signal_server.shutdown().await;
    });

    server.start().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
