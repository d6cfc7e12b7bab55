//! Router fixtures: an app state backed by a real engine and stand-in jobs.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{body::Body, http::Response, Router};
use boxd_core::{
    config::{BoxdConfig, SchedulerConfig},
    StatusBoard,
};
use boxd_jobs::ButtonRelay;
use boxd_scheduler::{Job, JobContext, JobError, JobManager, Recurrence, SchedulerEngine};
use boxd_system::LogShield;
use serde_json::{json, Value};
use tokio::{sync::watch, task::JoinHandle};

use crate::app::{build_router, AppState};

/// Publishes its name and arguments under the `echo` topic.
struct EchoJob {
    name: &'static str,
    recurrence: Recurrence,
}

#[async_trait]
impl Job for EchoJob {
    fn name(&self) -> &str {
        self.name
    }

    fn initial_recurrence(&self) -> Recurrence {
        self.recurrence
    }

    async fn execute(&mut self, ctx: &mut JobContext<'_>) -> Result<(), JobError> {
        ctx.board
            .set("echo", json!({ "job": self.name, "args": ctx.args }));
        Ok(())
    }
}

pub struct TestApp {
    pub state: Arc<AppState>,
    pub board: Arc<StatusBoard>,
    engine: Option<SchedulerEngine>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_buffer(8)
    }

    pub fn with_buffer(trigger_buffer: usize) -> Self {
        let board = Arc::new(StatusBoard::new());
        let mut manager = JobManager::new(Default::default(), Arc::clone(&board));
        manager.register(EchoJob {
            name: "LED",
            recurrence: Recurrence::every(3600),
        });
        manager.register(EchoJob {
            name: "BackupRestore",
            recurrence: Recurrence::Disabled,
        });
        let jobs = manager.names().map(str::to_string).collect();

        let config = SchedulerConfig {
            poll_interval_ms: 10,
            trigger_buffer,
        };
        let (engine, scheduler) = SchedulerEngine::new(manager, &config);
        let button = ButtonRelay::new(Arc::new(LogShield), scheduler.clone());
        let state = Arc::new(AppState::new(
            BoxdConfig::default(),
            Arc::clone(&board),
            scheduler,
            button,
            jobs,
        ));

        Self {
            state,
            board,
            engine: Some(engine),
        }
    }

    /// State whose engine is already gone.
    pub fn without_engine() -> Self {
        let mut app = Self::new();
        app.engine = None;
        app
    }

    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.state))
    }

    pub fn spawn_engine(&mut self) -> (watch::Sender<bool>, JoinHandle<JobManager>) {
        let engine = self.engine.take().expect("engine already taken");
        let (tx, rx) = watch::channel(false);
        (tx, tokio::spawn(engine.run(rx)))
    }

    /// Wait until the engine has published something under `topic`.
    pub async fn wait_for(&self, topic: &str) -> Option<Value> {
        for _ in 0..200 {
            if let Some(value) = self.board.get(topic) {
                return Some(value);
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        None
    }
}

pub async fn body_json(res: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
