//! Line-matching server.
//!
//! # Responsibilities
//! - Own the shared [`ServerContext`] and the lifecycle phase
//! - Accept connections and run each on its own task
//! - Run periodic maintenance (metrics summary, rate window sweep)
//! - Sequence shutdown: stop accepting, drain, release, report
//!
//! # Design Decisions
//! - Connection I/O runs on the Tokio scheduler; only lookups go to workers
//! - A failing or panicking connection never affects the accept loop
//! - No per-request timeout; the only deadline is the shutdown grace period

pub mod context;
pub mod handler;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_rustls::TlsAcceptor;

use crate::admin;
use crate::config::{validate_config, ConfigError, ServerConfig};
use crate::lifecycle::startup::{self, Prepared, StartupError};
use crate::lifecycle::{Phase, Shutdown, ShutdownSignal};
use crate::net::{ConnectionPermit, Listener, ListenerError};
use crate::observability::metrics::MetricsSnapshot;

pub use context::ServerContext;
pub use handler::{handle_connection, InternalError, Outcome};

/// A line-matching server and its lifecycle.
///
/// `start` runs until `shutdown` is called from elsewhere (another task,
/// a signal handler); `shutdown` waits for `start` to finish its teardown.
pub struct LineServer {
    ctx: Arc<ServerContext>,
    shutdown: Shutdown,
    phase: watch::Sender<Phase>,
    local_addr: watch::Sender<Option<SocketAddr>>,
}

impl LineServer {
    /// Validate `config` and build the shared context. Nothing is loaded or bound yet.
    pub fn new(config: ServerConfig) -> Result<Self, StartupError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let (phase, _) = watch::channel(Phase::Created);
        let (local_addr, _) = watch::channel(None);
        Ok(Self {
            ctx: Arc::new(ServerContext::new(config)),
            shutdown: Shutdown::new(),
            phase,
            local_addr,
        })
    }

    pub fn context(&self) -> &Arc<ServerContext> {
        &self.ctx
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.ctx.metrics.snapshot()
    }

    /// Wait until the server is listening. `None` if startup failed or the
    /// server stopped before binding.
    pub async fn listening(&self) -> Option<SocketAddr> {
        let mut phase = self.phase.subscribe();
        let reached = phase
            .wait_for(|p| matches!(p, Phase::Listening | Phase::ShuttingDown | Phase::Stopped))
            .await
            .map(|p| *p)
            .ok()?;
        match reached {
            Phase::Listening | Phase::ShuttingDown => *self.local_addr.borrow(),
            _ => None,
        }
    }

    /// Load, bind, and serve until shutdown. May be called once.
    pub async fn start(&self) -> Result<(), StartupError> {
        let claimed = self.phase.send_if_modified(|phase| {
            if *phase == Phase::Created {
                *phase = Phase::Loading;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(StartupError::AlreadyStarted);
        }

        let prepared = match startup::prepare(&self.ctx).await {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::error!(error = %e, "Startup failed");
                self.ctx.executor.shutdown().await;
                self.phase.send_replace(Phase::Stopped);
                return Err(e);
            }
        };

        self.serve(prepared).await;
        Ok(())
    }

    /// Stop accepting, drain, and wait for teardown. A no-op unless started.
    pub async fn shutdown(&self) {
        if matches!(self.phase(), Phase::Created | Phase::Stopped) {
            return;
        }
        if self.shutdown.trigger() {
            tracing::info!("Shutting down server");
        }

        let mut phase = self.phase.subscribe();
        let _ = phase.wait_for(|p| *p == Phase::Stopped).await;
    }

    async fn serve(&self, prepared: Prepared) {
        let Prepared { listener, tls } = prepared;
        let local_addr = listener.local_addr().ok();
        self.local_addr.send_replace(local_addr);
        self.phase.send_replace(Phase::Listening);
        tracing::info!(address = ?local_addr, "Server is running");

        let mut background = JoinSet::new();
        background.spawn(maintenance(Arc::clone(&self.ctx), self.shutdown.subscribe()));
        if self.ctx.config.admin.enabled {
            background.spawn(admin::serve(
                Arc::clone(&self.ctx),
                self.phase.subscribe(),
                self.shutdown.subscribe(),
            ));
        }

        let mut connections = JoinSet::new();
        self.accept_loop(&listener, tls, &mut connections).await;

        // Stop accepting new connections.
        drop(listener);
        self.phase.send_replace(Phase::ShuttingDown);

        self.drain(&mut connections).await;
        while background.join_next().await.is_some() {}

        self.ctx.executor.shutdown().await;
        self.ctx.store.release();
        self.ctx.metrics.log_summary("Final metrics");

        self.phase.send_replace(Phase::Stopped);
        tracing::info!("Server shut down successfully");
    }

    async fn accept_loop(
        &self,
        listener: &Listener,
        tls: Option<TlsAcceptor>,
        connections: &mut JoinSet<()>,
    ) {
        let mut signal = self.shutdown.subscribe();
        loop {
            tokio::select! {
                _ = signal.recv() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => {
                        connections.spawn(serve_connection(
                            Arc::clone(&self.ctx),
                            stream,
                            peer,
                            permit,
                            tls.clone(),
                        ));
                    }
                    Err(ListenerError::Closed) => break,
                    Err(e) => tracing::warn!(error = %e, "Accept failed"),
                },
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    self.reap(joined);
                }
            }
        }
    }

    async fn drain(&self, connections: &mut JoinSet<()>) {
        let grace = Duration::from_secs(self.ctx.config.lifecycle.shutdown_grace_secs);
        tracing::info!(
            in_flight = connections.len(),
            grace_secs = grace.as_secs(),
            "Waiting for in-flight connections"
        );

        let finished = tokio::time::timeout(grace, async {
            while let Some(joined) = connections.join_next().await {
                self.reap(joined);
            }
        })
        .await;

        if finished.is_err() {
            tracing::warn!(remaining = connections.len(), "Closing remaining connections");
            connections.abort_all();
            while let Some(joined) = connections.join_next().await {
                self.reap(joined);
            }
        }
        tracing::info!("Server connections closed");
    }

    fn reap(&self, joined: Result<(), tokio::task::JoinError>) {
        if let Err(e) = joined {
            if e.is_panic() {
                self.ctx.metrics.record_failure();
                tracing::error!(error = %e, "Connection task panicked");
            }
        }
    }
}

/// Handshake if needed, then hand the stream to the protocol handler.
async fn serve_connection(
    ctx: Arc<ServerContext>,
    stream: TcpStream,
    peer: SocketAddr,
    _permit: ConnectionPermit,
    tls: Option<TlsAcceptor>,
) {
    let guard = ctx.connections.track();
    let id = guard.id();
    tracing::debug!(connection_id = %id, peer_addr = %peer, "Client connected");

    match tls {
        Some(acceptor) => match acceptor.accept(stream).await {
            Ok(stream) => handle_connection(&ctx, stream, peer, id).await,
            Err(e) => {
                tracing::warn!(connection_id = %id, peer_addr = %peer, error = %e, "TLS handshake failed");
            }
        },
        None => handle_connection(&ctx, stream, peer, id).await,
    }
}

/// Periodic metrics summary and rate window sweep.
async fn maintenance(ctx: Arc<ServerContext>, mut shutdown: ShutdownSignal) {
    let period = Duration::from_secs(ctx.config.observability.report_interval_secs.max(1));
    let mut ticker = tokio::time::interval(period);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let swept = ctx.limiter.sweep(Instant::now());
                tracing::debug!(
                    swept,
                    tracked = ctx.limiter.tracked_addresses(),
                    active_connections = ctx.connections.active_count(),
                    "Maintenance"
                );
                ctx.metrics.log_summary("Metrics");
            }
            _ = shutdown.recv() => break,
        }
    }
}
