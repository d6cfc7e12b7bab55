//! Backup/restore as a resumable job.
//!
//! A backup can take far longer than the scheduler may be blocked, so the
//! job advances its operation by exactly one progress record per dispatch
//! and asks to be polled every second until the operation's stream ends:
//!
//! ```text
//!  Idle ──start(tar_path, mode)──▶ Starting ──pull──▶ Running ──pull──┐
//!   ▲                                                   │  ▲          │
//!   └──────────────── stream exhausted ◀────────────────┘  └──────────┘
//! ```
//!
//! Whether a dispatch starts an operation or pulls progress is decided only
//! by whether an operation is in flight. Start arguments sent while one is
//! running are ignored and the dispatch pulls the next record. If a pull
//! panics the operation is lost; the next scheduled dispatch finds the job
//! idle but still polled and turns polling off.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use boxd_core::progress::{BackupMode, BackupProvider, ProgressStream};
use futures_util::StreamExt;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::{
    error::JobError,
    job::{Job, JobContext, Recurrence},
};

pub const BACKUP_RESTORE_JOB: &str = "BackupRestore";
/// Board topic carrying the progress of the current or last operation.
pub const BACKUP_RESTORE_TOPIC: &str = "backup_restore";

const MISSING_ARGS_MSG: &str =
    "Requested starting BackupRestore-Job without 'tar_path' and/or 'mode' arg";
const INVALID_MODE_MSG: &str = "'mode' arg needs to be either 'backup' or 'restore'";

/// Externally visible phase of the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Idle,
    /// Operation created, no record pulled yet.
    Starting,
    Running,
}

struct Operation {
    mode: BackupMode,
    progress: ProgressStream,
}

enum Phase {
    Idle,
    Starting(Operation),
    Running(Operation),
}

pub struct BackupRestoreJob {
    provider: Arc<dyn BackupProvider>,
    phase: Phase,
}

impl BackupRestoreJob {
    pub fn new(provider: Arc<dyn BackupProvider>) -> Self {
        Self {
            provider,
            phase: Phase::Idle,
        }
    }

    pub fn state(&self) -> OperationState {
        match self.phase {
            Phase::Idle => OperationState::Idle,
            Phase::Starting(_) => OperationState::Starting,
            Phase::Running(_) => OperationState::Running,
        }
    }

    /// Mode of the operation in flight.
    pub fn mode(&self) -> Option<BackupMode> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Starting(op) | Phase::Running(op) => Some(op.mode),
        }
    }

    /// Validate the start request and create the operation.
    ///
    /// Invalid requests leave the job idle with its recurrence untouched and
    /// put one notice on the board.
    fn start(&mut self, ctx: &mut JobContext<'_>) {
        let args = ctx.args;
        let (Some(tar_path), Some(mode)) = (args.get("tar_path"), args.get("mode")) else {
            reject(ctx, MISSING_ARGS_MSG);
            return;
        };
        let Ok(mode) = mode.parse::<BackupMode>() else {
            reject(ctx, INVALID_MODE_MSG);
            return;
        };

        ctx.board.update(
            BACKUP_RESTORE_TOPIC,
            json!({
                "state": "starting",
                "percent": 0,
                "who": "all",
                "tar_path": tar_path,
                "what": mode.operation(),
                "mode": mode.as_str(),
            }),
        );

        let progress = match mode {
            BackupMode::Backup => self.provider.full_export(Path::new(tar_path)),
            BackupMode::Restore => self.provider.full_import(Path::new(tar_path)),
        };
        info!(%mode, tar_path = %tar_path, "backup/restore operation started");

        self.phase = Phase::Starting(Operation { mode, progress });
        ctx.reschedule(Recurrence::every(1));
    }

    /// Pull one record from `op` and publish it, or finish when it is done.
    async fn advance(&mut self, mut op: Operation, ctx: &mut JobContext<'_>) {
        match op.progress.next().await {
            Some(record) => {
                debug!(state = %record.state, who = %record.who, percent = record.percent, "backup/restore progress");
                ctx.board.set(
                    BACKUP_RESTORE_TOPIC,
                    json!({
                        "state": record.state,
                        "who": record.who,
                        "what": record.what,
                        "percent": record.percent,
                    }),
                );
                self.phase = Phase::Running(op);
            }
            None => {
                info!(mode = %op.mode, "backup/restore operation finished");
                self.phase = Phase::Idle;
                ctx.disable();
            }
        }
    }
}

fn reject(ctx: &JobContext<'_>, message: &str) {
    error!("{message}");
    ctx.board.push_message(message);
}

fn has_start_args(ctx: &JobContext<'_>) -> bool {
    ctx.args.contains_key("tar_path") || ctx.args.contains_key("mode")
}

#[async_trait]
impl Job for BackupRestoreJob {
    fn name(&self) -> &str {
        BACKUP_RESTORE_JOB
    }

    fn initial_recurrence(&self) -> Recurrence {
        Recurrence::Disabled
    }

    async fn execute(&mut self, ctx: &mut JobContext<'_>) -> Result<(), JobError> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            // Still polled while idle: the last pull unwound and dropped the
            // operation. Stop polling instead of treating the tick as a start.
            Phase::Idle if !ctx.recurrence().is_disabled() && !has_start_args(ctx) => {
                warn!("backup/restore operation was aborted, polling stopped");
                ctx.disable();
            }
            Phase::Idle => self.start(ctx),
            Phase::Starting(op) | Phase::Running(op) => {
                if has_start_args(ctx) {
                    warn!(mode = %op.mode, "operation already in progress, start arguments ignored");
                }
                self.advance(op, ctx).await;
            }
        }
        Ok(())
    }
}
