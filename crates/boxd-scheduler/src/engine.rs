use std::time::Duration;

use boxd_core::config::SchedulerConfig;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::{
    error::{Result, SchedulerError},
    job::JobArgs,
    manager::JobManager,
};

/// Request to run one job by name, whatever its recurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub job: String,
    #[serde(default)]
    pub args: JobArgs,
}

impl Trigger {
    pub fn new(job: impl Into<String>, args: JobArgs) -> Self {
        Self {
            job: job.into(),
            args,
        }
    }
}

/// Cloneable sending side of the engine's trigger queue.
///
/// Triggers are queued, never run inline, so the engine stays the only task
/// that touches job state.
#[derive(Clone)]
pub struct SchedulerHandle {
    tx: mpsc::Sender<Trigger>,
}

impl SchedulerHandle {
    /// Queue a trigger, waiting for room if the queue is full.
    pub async fn trigger(&self, job: impl Into<String>, args: JobArgs) -> Result<()> {
        self.tx
            .send(Trigger::new(job, args))
            .await
            .map_err(|_| SchedulerError::EngineStopped)
    }

    /// Queue a trigger without waiting.
    pub fn try_trigger(&self, job: impl Into<String>, args: JobArgs) -> Result<()> {
        self.tx
            .try_send(Trigger::new(job, args))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(t) => SchedulerError::QueueFull { job: t.job },
                mpsc::error::TrySendError::Closed(_) => SchedulerError::EngineStopped,
            })
    }

    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Drives a [`JobManager`]: polls for due jobs on a fixed interval and runs
/// queued triggers in between. Job bodies never overlap.
pub struct SchedulerEngine {
    manager: JobManager,
    triggers: mpsc::Receiver<Trigger>,
    poll_interval: Duration,
}

impl SchedulerEngine {
    pub fn new(manager: JobManager, config: &SchedulerConfig) -> (Self, SchedulerHandle) {
        let (tx, triggers) = mpsc::channel(config.trigger_buffer.max(1));
        let engine = Self {
            manager,
            triggers,
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
        };
        (engine, SchedulerHandle { tx })
    }

    pub fn manager(&self) -> &JobManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut JobManager {
        &mut self.manager
    }

    /// Main loop. Runs until `shutdown` broadcasts `true` or its sender is
    /// dropped, then hands the manager back.
    ///
    /// A job body in progress is always finished first; shutdown is only
    /// observed between dispatches.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> JobManager {
        info!(
            jobs = self.manager.len(),
            poll_ms = self.poll_interval.as_millis() as u64,
            "scheduler engine started"
        );

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut triggers_open = true;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick().await;
                }
                trigger = self.triggers.recv(), if triggers_open => match trigger {
                    Some(trigger) => {
                        debug!(job = %trigger.job, "explicit trigger");
                        self.manager.dispatch(&trigger.job, &trigger.args).await;
                    }
                    None => {
                        debug!("all scheduler handles dropped, polling only");
                        triggers_open = false;
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        warn!("shutdown sender dropped, stopping scheduler engine");
                        break;
                    }
                    if *shutdown.borrow() {
                        info!("scheduler engine shutting down");
                        break;
                    }
                }
            }
        }

        self.manager
    }

    /// Dispatch due jobs one after another, each time picking the first due
    /// job in registration order. Returns the number of dispatches.
    ///
    /// At most one dispatch per registered job happens per tick, so a job
    /// that keeps itself due (interval 0) cannot starve triggers.
    pub async fn tick(&mut self) -> usize {
        let mut dispatched = 0;
        for _ in 0..self.manager.len() {
            let Some(name) = self.manager.next_due() else {
                break;
            };
            self.manager.dispatch(&name, &JobArgs::new()).await;
            dispatched += 1;
        }
        dispatched
    }
}
