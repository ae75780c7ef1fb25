//! Operator status endpoint.
//!
//! A small axum router bound next to the line listener. Every route sits
//! behind a bearer-token check; it reports state and never changes it.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::watch;

use self::auth::admin_auth_middleware;
use self::handlers::{get_metrics, get_status};
use crate::lifecycle::{Phase, ShutdownSignal};
use crate::server::ServerContext;

/// State shared by the admin routes.
#[derive(Clone)]
pub struct AdminState {
    pub ctx: Arc<ServerContext>,
    pub phase: watch::Receiver<Phase>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/metrics", get(get_metrics))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .with_state(state)
}

/// Serve the admin router until `shutdown` fires. Failures are logged, never fatal.
pub async fn serve(
    ctx: Arc<ServerContext>,
    phase: watch::Receiver<Phase>,
    mut shutdown: ShutdownSignal,
) {
    let address = ctx.config.admin.bind_address.clone();
    let listener = match TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(address = %address, error = %e, "Admin endpoint failed to bind");
            return;
        }
    };
    tracing::info!(address = %address, "Admin endpoint listening");

    let app = setup_admin_router(AdminState { ctx, phase });
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.recv().await })
        .await;
    if let Err(e) = result {
        tracing::error!(error = %e, "Admin endpoint stopped");
    }
}
