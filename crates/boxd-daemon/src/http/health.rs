use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::app::AppState;

/// GET /health: liveness probe, returns daemon metadata.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let scheduler = if state.scheduler.is_running() {
        "running"
    } else {
        "stopped"
    };
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "scheduler": scheduler,
        "jobs": state.jobs,
        "debian_package": state.config.appliance.debian_package,
    }))
}
