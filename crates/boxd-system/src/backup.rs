//! Full backup and restore of the appliance data directories with `tar`.
//!
//! One archive holds every configured source directory, each stored under its
//! own basename. Export and import are lazy streams: a record is produced
//! per source, and the `tar` call for that source only runs when the
//! consumer pulls the record.

use std::path::{Path, PathBuf};

use async_stream::stream;
use boxd_command::{CommandRunner, ExecOptions};
use boxd_core::config::{BackupConfig, BackupSource};
use boxd_core::progress::{BackupProvider, BackupMode, Progress, ProgressStream};
use tracing::{info, warn};

pub struct TarBackup {
    sources: Vec<BackupSource>,
    runner: CommandRunner,
}

impl TarBackup {
    pub fn new(config: &BackupConfig) -> Self {
        Self {
            sources: config.sources.clone(),
            runner: CommandRunner::new(ExecOptions::default().with_timeout_secs(config.timeout_secs)),
        }
    }

    fn operation(&self, mode: BackupMode, tar_path: &Path) -> ProgressStream {
        let sources = self.sources.clone();
        let runner = self.runner.clone();
        let tar_path = tar_path.to_path_buf();
        let what = mode.operation();

        Box::pin(stream! {
            info!(mode = %mode, tar_path = %tar_path.display(), "backup operation started");
            yield Progress::new("starting", "all", what, 0);

            let total = sources.len();
            for (done, source) in sources.iter().enumerate() {
                let argv = tar_argv(mode, &tar_path, source, done == 0);
                if let Err(e) = runner.run_checked(&argv).await {
                    warn!(source = %source.name, error = %e, "tar failed");
                    yield Progress::new("failed", source.name.as_str(), what, percent(done, total));
                    return;
                }
                yield Progress::new("running", source.name.as_str(), what, percent(done + 1, total));
            }

            info!(mode = %mode, "backup operation finished");
            yield Progress::new("finished", "all", what, 100);
        })
    }
}

impl BackupProvider for TarBackup {
    fn full_export(&self, tar_path: &Path) -> ProgressStream {
        self.operation(BackupMode::Backup, tar_path)
    }

    fn full_import(&self, tar_path: &Path) -> ProgressStream {
        self.operation(BackupMode::Restore, tar_path)
    }
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done * 100) / total).min(100) as u8
}

/// `tar` argv handling one source; the first export source creates the
/// archive, later ones append to it.
fn tar_argv(mode: BackupMode, tar_path: &Path, source: &BackupSource, first: bool) -> Vec<String> {
    let parent = source
        .path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/"));
    let member = source
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string());

    let action = match (mode, first) {
        (BackupMode::Backup, true) => "--create",
        (BackupMode::Backup, false) => "--append",
        (BackupMode::Restore, _) => "--extract",
    };

    vec![
        "tar".to_string(),
        action.to_string(),
        "--file".to_string(),
        tar_path.to_string_lossy().into_owned(),
        "--directory".to_string(),
        parent.to_string_lossy().into_owned(),
        member,
    ]
}
