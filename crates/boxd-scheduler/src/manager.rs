use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use boxd_core::{config::ApplianceConfig, StatusBoard};
use futures_util::FutureExt;
use indexmap::IndexMap;
use tracing::{error, info, warn};

use crate::{
    error::JobError,
    job::{Job, JobArgs, ScheduledJob},
};

/// What became of a single dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Completed,
    /// The body returned an error or panicked; the message was logged.
    Failed(String),
    UnknownJob,
}

/// Registry of all jobs and the single place job bodies are run from.
///
/// Holds one instance per name in registration order. A failing or panicking
/// job never escapes [`dispatch`](Self::dispatch), so one broken job cannot
/// stop the scheduler or the jobs after it.
pub struct JobManager {
    config: ApplianceConfig,
    board: Arc<StatusBoard>,
    jobs: IndexMap<String, ScheduledJob>,
}

impl JobManager {
    pub fn new(config: ApplianceConfig, board: Arc<StatusBoard>) -> Self {
        Self {
            config,
            board,
            jobs: IndexMap::new(),
        }
    }

    /// Register a job under its name.
    ///
    /// A job already registered under that name is replaced; the replacement
    /// keeps the original position in the due-job scan.
    pub fn register(&mut self, job: impl Job + 'static) {
        self.register_boxed(Box::new(job));
    }

    pub fn register_boxed(&mut self, job: Box<dyn Job>) {
        let name = job.name().to_string();
        info!(job = %name, "registering job");
        if self.jobs.contains_key(&name) {
            warn!(job = %name, "overwriting job (during register) with the same name");
        }
        self.jobs.insert(name, ScheduledJob::new(job));
    }

    /// Run the named job once with `args`.
    ///
    /// Unknown names are logged and ignored. Errors and panics raised by the
    /// job are logged and reported in the outcome, never propagated.
    pub async fn dispatch(&mut self, name: &str, args: &JobArgs) -> DispatchOutcome {
        let Some(job) = self.jobs.get_mut(name) else {
            error!(job = name, "could not find job with name");
            return DispatchOutcome::UnknownJob;
        };

        let run = job.run(&mut self.config, &self.board, args);
        let result = match AssertUnwindSafe(run).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(JobError::Panicked(panic_message(payload.as_ref()))),
        };

        match result {
            Ok(()) => DispatchOutcome::Completed,
            Err(e) => {
                error!(job = name, error = %e, detail = ?e, "failed running job");
                DispatchOutcome::Failed(e.to_string())
            }
        }
    }

    /// Name of the first job, in registration order, that is due now.
    pub fn next_due(&self) -> Option<String> {
        self.jobs
            .iter()
            .find(|(_, job)| job.is_due())
            .map(|(name, _)| name.clone())
    }

    pub fn get(&self, name: &str) -> Option<&ScheduledJob> {
        self.jobs.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ScheduledJob> {
        self.jobs.get_mut(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.jobs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn board(&self) -> &Arc<StatusBoard> {
        &self.board
    }

    pub fn config(&self) -> &ApplianceConfig {
        &self.config
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
