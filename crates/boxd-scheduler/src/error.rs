use thiserror::Error;

/// Errors a job body can raise. All of them stop at the job manager.
#[derive(Debug, Error)]
pub enum JobError {
    /// An external collaborator (occ, apt, systemd, …) failed.
    #[error("{context}: {source}")]
    Collaborator {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The job body panicked; the payload message is kept when it is a string.
    #[error("Job panicked: {0}")]
    Panicked(String),
}

impl JobError {
    pub fn collaborator(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        JobError::Collaborator {
            context: context.into(),
            source: source.into(),
        }
    }
}

/// Errors returned to code that hands work to a running engine.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The engine loop has exited; nobody will receive the trigger.
    #[error("Scheduler engine is not running")]
    EngineStopped,

    /// The trigger queue is at capacity.
    #[error("Trigger queue full (job: {job})")]
    QueueFull { job: String },
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
