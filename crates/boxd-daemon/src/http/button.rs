//! Button edges for hosts without the GPIO board: POST /button/{event}
//!
//! `event` is one of `pressed`, `released`, `held`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use boxd_jobs::ButtonEvent;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::app::AppState;

/// POST /button/{event}: feed one button edge to the relay.
pub async fn button_handler(
    State(state): State<Arc<AppState>>,
    Path(event): Path<String>,
) -> (StatusCode, Json<Value>) {
    let event: ButtonEvent = match event.parse() {
        Ok(event) => event,
        Err(e) => return (StatusCode::BAD_REQUEST, Json(json!({ "error": e }))),
    };

    match state.button.handle(event).await {
        Ok(()) => (StatusCode::ACCEPTED, Json(json!({ "event": event }))),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}
