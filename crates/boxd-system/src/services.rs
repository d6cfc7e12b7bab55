use async_trait::async_trait;
use boxd_command::CommandRunner;
use tracing::info;

use crate::error::Result;

/// Starts host services by name. Fire-and-forget: success means the start
/// request was accepted, not that the service finished.
#[async_trait]
pub trait ServiceLauncher: Send + Sync {
    async fn start(&self, service: &str) -> Result<()>;
}

/// systemd-backed launcher.
pub struct Systemd {
    runner: CommandRunner,
}

impl Systemd {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl ServiceLauncher for Systemd {
    async fn start(&self, service: &str) -> Result<()> {
        info!(service, "starting service");
        // --no-block: oneshot units like the updater would otherwise hold
        // the scheduler until they exit.
        self.runner
            .run_checked(&["systemctl", "start", "--no-block", service])
            .await?;
        Ok(())
    }
}
