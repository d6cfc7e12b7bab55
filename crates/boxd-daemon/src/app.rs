use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use boxd_core::{config::BoxdConfig, StatusBoard};
use boxd_jobs::ButtonRelay;
use boxd_scheduler::SchedulerHandle;
use tower_http::trace::TraceLayer;

/// Central shared state: passed as Arc<AppState> to all Axum handlers.
///
/// Handlers read the board directly but never touch jobs; everything that
/// runs a job goes through the scheduler handle.
pub struct AppState {
    pub config: BoxdConfig,
    pub board: Arc<StatusBoard>,
    pub scheduler: SchedulerHandle,
    pub button: ButtonRelay,
    /// Registered job names, fixed once the engine is running.
    pub jobs: Vec<String>,
}

impl AppState {
    pub fn new(
        config: BoxdConfig,
        board: Arc<StatusBoard>,
        scheduler: SchedulerHandle,
        button: ButtonRelay,
        jobs: Vec<String>,
    ) -> Self {
        Self {
            config,
            board,
            scheduler,
            button,
            jobs,
        }
    }

    pub fn has_job(&self, name: &str) -> bool {
        self.jobs.iter().any(|j| j == name)
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/status", get(crate::http::status::status_handler))
        .route("/status/{topic}", get(crate::http::status::topic_handler))
        .route("/messages", get(crate::http::status::messages_handler))
        .route("/jobs/{name}", post(crate::http::jobs::trigger_handler))
        .route("/button/{event}", post(crate::http::button::button_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
