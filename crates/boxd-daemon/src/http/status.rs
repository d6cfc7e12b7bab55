//! Status board read side: what the UI polls.
//!
//! `GET /status` returns every topic, `GET /status/{topic}` a single record,
//! `GET /messages` drains the notice queue (each message is delivered once).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::app::AppState;

#[derive(Serialize)]
pub struct StatusError {
    pub error: String,
}

#[derive(Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<String>,
}

/// GET /status: snapshot of all topics.
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<BTreeMap<String, Value>> {
    Json(state.board.snapshot())
}

/// GET /status/{topic}: latest record for one topic.
pub async fn topic_handler(
    State(state): State<Arc<AppState>>,
    Path(topic): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<StatusError>)> {
    state.board.get(&topic).map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(StatusError {
                error: format!("unknown topic: {topic}"),
            }),
        )
    })
}

/// GET /messages: drain and return all pending notices.
pub async fn messages_handler(State(state): State<Arc<AppState>>) -> Json<MessagesResponse> {
    Json(MessagesResponse {
        messages: state.board.drain_messages(),
    })
}
