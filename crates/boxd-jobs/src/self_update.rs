use std::sync::Arc;

use async_trait::async_trait;
use boxd_core::config::FALLBACK_PACKAGE;
use boxd_scheduler::{Job, JobContext, JobError, Recurrence};
use boxd_system::{LedState, PackageIndex, PackageStatus, ServiceLauncher, Shield};
use tracing::{debug, error, info};

pub const SELF_UPDATE_JOB: &str = "SelfUpdate";

/// Checks once after startup whether the appliance package needs to be
/// installed or upgraded, and hands the actual work to the updater service.
///
/// Switching `debian_package` (e.g. to a testing channel) shows up here as
/// "not installed" and triggers the updater as well.
pub struct SelfUpdateJob {
    shield: Arc<dyn Shield>,
    packages: Arc<dyn PackageIndex>,
    services: Arc<dyn ServiceLauncher>,
    updater: String,
}

impl SelfUpdateJob {
    pub fn new(
        shield: Arc<dyn Shield>,
        packages: Arc<dyn PackageIndex>,
        services: Arc<dyn ServiceLauncher>,
        updater: impl Into<String>,
    ) -> Self {
        Self {
            shield,
            packages,
            services,
            updater: updater.into(),
        }
    }

    async fn update(&self, package: &str) -> Result<(), JobError> {
        self.packages
            .refresh()
            .await
            .map_err(|e| JobError::collaborator("refreshing package index", e))?;

        let Some(status) = self.find_package(package).await? else {
            error!(package, "self-update impossible, fallback package missing from index");
            return Ok(());
        };

        if !status.is_installed() {
            info!(package = %status.name, service = %self.updater, "installing package");
        } else if status.is_upgradable() {
            info!(package = %status.name, service = %self.updater, "upgrading package");
        } else {
            debug!(package = %status.name, "package up to date");
            return Ok(());
        }

        self.services
            .start(&self.updater)
            .await
            .map_err(|e| JobError::collaborator("starting updater service", e))
    }

    /// The configured package, or the fallback package if the index does not
    /// know it.
    async fn find_package(&self, package: &str) -> Result<Option<PackageStatus>, JobError> {
        if let Some(status) = self.lookup(package).await? {
            return Ok(Some(status));
        }
        if package == FALLBACK_PACKAGE {
            return Ok(None);
        }
        error!(package, fallback = FALLBACK_PACKAGE, "designated package not found, falling back");
        self.lookup(FALLBACK_PACKAGE).await
    }

    async fn lookup(&self, package: &str) -> Result<Option<PackageStatus>, JobError> {
        self.packages
            .lookup(package)
            .await
            .map_err(|e| JobError::collaborator(format!("looking up package {package}"), e))
    }
}

#[async_trait]
impl Job for SelfUpdateJob {
    fn name(&self) -> &str {
        SELF_UPDATE_JOB
    }

    fn initial_recurrence(&self) -> Recurrence {
        Recurrence::every(1)
    }

    async fn execute(&mut self, ctx: &mut JobContext<'_>) -> Result<(), JobError> {
        ctx.disable();
        self.shield.set_led_state(LedState::Updating);

        let package = ctx.config.debian_package.clone();
        let result = self.update(&package).await;

        self.shield.set_led_state(LedState::Ready);
        result
    }
}
