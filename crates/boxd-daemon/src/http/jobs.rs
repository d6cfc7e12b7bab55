//! Explicit job triggers: POST /jobs/{name}
//!
//! Body: optional JSON object of string arguments, e.g.
//! `{"tar_path": "/media/usb/backup.tar", "mode": "backup"}`.
//! The job is queued for the scheduler engine, never run inline; the
//! response only confirms the trigger was accepted.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use boxd_scheduler::{JobArgs, SchedulerError};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::app::AppState;

#[derive(Serialize)]
pub struct TriggerResponse {
    pub queued: String,
}

#[derive(Serialize)]
pub struct TriggerError {
    pub error: String,
}

type TriggerRejection = (StatusCode, Json<TriggerError>);

fn reject(status: StatusCode, error: impl Into<String>) -> TriggerRejection {
    (
        status,
        Json(TriggerError {
            error: error.into(),
        }),
    )
}

/// POST /jobs/{name}: queue one run of the named job.
pub async fn trigger_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<TriggerResponse>), TriggerRejection> {
    if !state.has_job(&name) {
        return Err(reject(StatusCode::NOT_FOUND, format!("unknown job: {name}")));
    }

    let args: JobArgs = if body.iter().all(u8::is_ascii_whitespace) {
        JobArgs::new()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            reject(
                StatusCode::BAD_REQUEST,
                format!("arguments must be a JSON object of strings: {e}"),
            )
        })?
    };

    match state.scheduler.try_trigger(name.as_str(), args) {
        Ok(()) => {
            info!(job = %name, "job trigger queued");
            Ok((StatusCode::ACCEPTED, Json(TriggerResponse { queued: name })))
        }
        Err(e @ SchedulerError::QueueFull { .. }) => {
            warn!(job = %name, "trigger queue full");
            Err(reject(StatusCode::TOO_MANY_REQUESTS, e.to_string()))
        }
        Err(e @ SchedulerError::EngineStopped) => {
            warn!(job = %name, "trigger rejected, scheduler engine stopped");
            Err(reject(StatusCode::SERVICE_UNAVAILABLE, e.to_string()))
        }
    }
}
