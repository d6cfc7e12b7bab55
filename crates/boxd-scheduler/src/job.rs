use std::collections::HashMap;

use async_trait::async_trait;
use boxd_core::{config::ApplianceConfig, StatusBoard};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::JobError;

/// String arguments passed along with a dispatch.
pub type JobArgs = HashMap<String, String>;

/// Whether and how often the poll loop dispatches a job on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recurrence {
    /// Only runs when dispatched explicitly by name.
    Disabled,

    /// Due once more than `secs` seconds have passed since the last run.
    Every { secs: u64 },
}

impl Recurrence {
    pub fn every(secs: u64) -> Self {
        Recurrence::Every { secs }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Recurrence::Disabled)
    }

    pub fn interval(&self) -> Option<Duration> {
        match self {
            Recurrence::Disabled => None,
            // out-of-range intervals saturate so the job is simply never due
            Recurrence::Every { secs } => Some(
                i64::try_from(*secs)
                    .ok()
                    .and_then(Duration::try_seconds)
                    .unwrap_or(Duration::MAX),
            ),
        }
    }
}

/// Everything a job body may touch during one execution.
pub struct JobContext<'a> {
    /// Appliance settings shared by all jobs; writes are seen by later runs.
    pub config: &'a mut ApplianceConfig,
    pub board: &'a StatusBoard,
    pub args: &'a JobArgs,
    recurrence: &'a mut Recurrence,
}

impl<'a> JobContext<'a> {
    pub fn new(
        config: &'a mut ApplianceConfig,
        board: &'a StatusBoard,
        args: &'a JobArgs,
        recurrence: &'a mut Recurrence,
    ) -> Self {
        Self {
            config,
            board,
            args,
            recurrence,
        }
    }

    /// The running job's current recurrence.
    pub fn recurrence(&self) -> Recurrence {
        *self.recurrence
    }

    /// Replace the running job's recurrence; takes effect for the next poll.
    pub fn reschedule(&mut self, recurrence: Recurrence) {
        if *self.recurrence != recurrence {
            debug!(from = ?self.recurrence, to = ?recurrence, "job rescheduled");
        }
        *self.recurrence = recurrence;
    }

    /// Stop automatic dispatch until something re-arms the job.
    pub fn disable(&mut self) {
        self.reschedule(Recurrence::Disabled);
    }
}

/// A named unit of work.
///
/// Implementations hold only their own state (e.g. collaborator handles or
/// an in-flight operation); timing is tracked by the [`ScheduledJob`]
/// wrapping them.
#[async_trait]
pub trait Job: Send {
    /// Unique name used for registration and dispatch.
    fn name(&self) -> &str;

    /// Recurrence in effect right after registration.
    fn initial_recurrence(&self) -> Recurrence;

    /// The job body. Errors propagate to the job manager, which logs them.
    async fn execute(&mut self, ctx: &mut JobContext<'_>) -> Result<(), JobError>;
}

/// A registered job plus its scheduling state.
pub struct ScheduledJob {
    job: Box<dyn Job>,
    recurrence: Recurrence,
    last_run: DateTime<Utc>,
}

impl ScheduledJob {
    /// Wrap `job`; the last-run clock starts now, so a periodic job first
    /// becomes due one full interval after registration.
    pub fn new(job: Box<dyn Job>) -> Self {
        let recurrence = job.initial_recurrence();
        Self {
            job,
            recurrence,
            last_run: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        self.job.name()
    }

    pub fn recurrence(&self) -> Recurrence {
        self.recurrence
    }

    pub fn last_run(&self) -> DateTime<Utc> {
        self.last_run
    }

    /// Move the last-run clock, e.g. to make a job due without waiting.
    pub fn set_last_run(&mut self, at: DateTime<Utc>) {
        self.last_run = at;
    }

    pub fn is_due(&self) -> bool {
        self.is_due_at(Utc::now())
    }

    /// True iff the job recurs and strictly more than its interval has
    /// elapsed between the last run and `now`.
    pub fn is_due_at(&self, now: DateTime<Utc>) -> bool {
        match self.recurrence.interval() {
            None => false,
            Some(interval) => now.signed_duration_since(self.last_run) > interval,
        }
    }

    /// Run the job body once.
    ///
    /// The last-run timestamp is taken before the body starts, so a body that
    /// fails still waits a full interval before the next attempt.
    pub async fn run(
        &mut self,
        config: &mut ApplianceConfig,
        board: &StatusBoard,
        args: &JobArgs,
    ) -> Result<(), JobError> {
        debug!(job = %self.job.name(), "starting job");
        self.last_run = Utc::now();

        let mut ctx = JobContext::new(config, board, args, &mut self.recurrence);
        self.job.execute(&mut ctx).await?;

        debug!(job = %self.job.name(), recurrence = ?self.recurrence, "finished job");
        Ok(())
    }
}
