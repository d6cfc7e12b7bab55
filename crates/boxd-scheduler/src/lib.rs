//! `boxd-scheduler`: cooperative, single-threaded job scheduling.
//!
//! # Overview
//!
//! Every job is registered once with the [`JobManager`] and keeps its own
//! [`Recurrence`] and last-run timestamp. The [`SchedulerEngine`] polls the
//! manager for the first due job (registration order breaks ties) and
//! forwards explicit [`Trigger`]s; both paths end in
//! [`JobManager::dispatch`], which runs one job body at a time and contains
//! every failure of it.
//!
//! # Recurrence
//!
//! | Variant    | Behaviour                                              |
//! |------------|--------------------------------------------------------|
//! | `Disabled` | Never dispatched by polling; explicit triggers only    |
//! | `Every`    | Due once more than `secs` seconds passed since last run|
//!
//! Job bodies change their own recurrence through [`JobContext`]; that is how
//! a job runs once, backs off, or polls itself every second while a
//! [`BackupRestoreJob`] operation is in flight.

pub mod engine;
pub mod error;
pub mod job;
pub mod manager;
pub mod resumable;

pub use engine::{SchedulerEngine, SchedulerHandle, Trigger};
pub use error::{JobError, SchedulerError};
pub use job::{Job, JobArgs, JobContext, Recurrence, ScheduledJob};
pub use manager::{DispatchOutcome, JobManager};
pub use resumable::{BackupRestoreJob, OperationState};
