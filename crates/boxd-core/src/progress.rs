use std::fmt;
use std::path::Path;
use std::pin::Pin;

use futures_util::Stream;
use serde::{Deserialize, Serialize};

/// One step reported by a long-running operation.
///
/// `state` is a free-form phase label ("starting", "running", "finished"),
/// `who`/`what` name the unit currently processed. `percent` is forwarded
/// as reported; nothing enforces that it only grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub state: String,
    pub who: String,
    pub what: String,
    pub percent: u8,
}

impl Progress {
    pub fn new(
        state: impl Into<String>,
        who: impl Into<String>,
        what: impl Into<String>,
        percent: u8,
    ) -> Self {
        Self {
            state: state.into(),
            who: who.into(),
            what: what.into(),
            percent,
        }
    }
}

/// Finite, single-use sequence of progress records.
///
/// Completion is signalled by the stream ending, never by a sentinel record.
pub type ProgressStream = Pin<Box<dyn Stream<Item = Progress> + Send>>;

/// Direction of a backup/restore operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupMode {
    Backup,
    Restore,
}

impl BackupMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupMode::Backup => "backup",
            BackupMode::Restore => "restore",
        }
    }

    /// Label published as `what` when the operation starts.
    pub fn operation(&self) -> &'static str {
        match self {
            BackupMode::Backup => "export",
            BackupMode::Restore => "import",
        }
    }
}

impl fmt::Display for BackupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BackupMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "backup" => Ok(BackupMode::Backup),
            "restore" => Ok(BackupMode::Restore),
            other => Err(format!("unknown backup mode: {other}")),
        }
    }
}

/// Source of resumable backup/restore operations.
///
/// Creating a stream must not do the work itself; each record is produced
/// only when the consumer pulls it.
pub trait BackupProvider: Send + Sync {
    fn full_export(&self, tar_path: &Path) -> ProgressStream;
    fn full_import(&self, tar_path: &Path) -> ProgressStream;
}
