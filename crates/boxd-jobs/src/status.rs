//! Jobs publishing appliance facts for the UI.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use boxd_scheduler::{Job, JobContext, JobError, Recurrence};
use boxd_system::PackageIndex;
use serde_json::json;
use tracing::error;

pub const GENERIC_STATUS_JOB: &str = "GenericStatusUpdate";
pub const HARDWARE_STATUS_JOB: &str = "HardwareStatusUpdate";

pub const PKGINFO_TOPIC: &str = "pkginfo";
pub const HWINFO_TOPIC: &str = "hwinfo";

/// Publishes the installed appliance package version once after startup.
pub struct GenericStatusJob {
    packages: Arc<dyn PackageIndex>,
}

impl GenericStatusJob {
    pub fn new(packages: Arc<dyn PackageIndex>) -> Self {
        Self { packages }
    }
}

#[async_trait]
impl Job for GenericStatusJob {
    fn name(&self) -> &str {
        GENERIC_STATUS_JOB
    }

    fn initial_recurrence(&self) -> Recurrence {
        Recurrence::every(15)
    }

    async fn execute(&mut self, ctx: &mut JobContext<'_>) -> Result<(), JobError> {
        ctx.disable();
        let pkg = ctx.config.debian_package.clone();

        let version = match self.packages.lookup(&pkg).await {
            Ok(Some(status)) => status.installed,
            Ok(None) => None,
            Err(e) => {
                error!(package = %pkg, error = %e, "failed getting package info");
                return Ok(());
            }
        };
        let Some(version) = version else {
            error!(package = %pkg, "failed getting package info, package not installed");
            return Ok(());
        };

        ctx.board
            .set(PKGINFO_TOPIC, json!({ "version": version, "pkg": pkg }));
        Ok(())
    }
}

/// Publishes the SoC temperature every two hours.
pub struct HardwareStatusJob {
    temperature_path: PathBuf,
}

impl HardwareStatusJob {
    pub fn new(temperature_path: impl Into<PathBuf>) -> Self {
        Self {
            temperature_path: temperature_path.into(),
        }
    }
}

#[async_trait]
impl Job for HardwareStatusJob {
    fn name(&self) -> &str {
        HARDWARE_STATUS_JOB
    }

    fn initial_recurrence(&self) -> Recurrence {
        Recurrence::every(7200)
    }

    async fn execute(&mut self, ctx: &mut JobContext<'_>) -> Result<(), JobError> {
        let raw = tokio::fs::read_to_string(&self.temperature_path).await?;
        ctx.board.set(HWINFO_TOPIC, json!({ "temp": raw.trim() }));
        Ok(())
    }
}
