use axum::{extract::State, Json};
use serde::Serialize;

use super::AdminState;
use crate::lifecycle::Phase;
use crate::observability::metrics::MetricsSnapshot;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub phase: Phase,
    pub dataset_generation: Option<u64>,
    pub dataset_lines: Option<usize>,
    pub active_connections: u64,
    pub tracked_addresses: usize,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let dataset = state.ctx.store.current();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        phase: *state.phase.borrow(),
        dataset_generation: dataset.as_ref().map(|d| d.generation()),
        dataset_lines: dataset.as_ref().map(|d| d.len()),
        active_connections: state.ctx.connections.active_count(),
        tracked_addresses: state.ctx.limiter.tracked_addresses(),
    })
}

pub async fn get_metrics(State(state): State<AdminState>) -> Json<MetricsSnapshot> {
    Json(state.ctx.metrics.snapshot())
}
