//! `boxd-jobs`: the appliance jobs run by the scheduler.
//!
//! | Job                    | Starts as    | Purpose                                  |
//! |------------------------|--------------|------------------------------------------|
//! | `LED`                  | every 1s     | signal readiness once after startup      |
//! | `FactoryReset`         | disabled     | wipe the box (button held)               |
//! | `BackupRestore`        | disabled     | full backup / restore, one step per tick |
//! | `EnableNextBoxApp`     | every 5s     | keep the companion app enabled           |
//! | `SelfUpdate`           | every 1s     | install or upgrade the appliance package |
//! | `GenericStatusUpdate`  | every 15s    | publish the package version              |
//! | `HardwareStatusUpdate` | every 7200s  | publish the SoC temperature              |
//! | `TrustedDomains`       | every 90s    | maintain the server's trusted domains    |
//!
//! Jobs only see their collaborators through the traits in `boxd-system`;
//! [`register_all`] wires the set the daemon runs with.

pub mod button;
pub mod enable_app;
pub mod factory_reset;
pub mod led;
pub mod self_update;
pub mod status;
pub mod trusted_domains;

#[cfg(test)]
mod fakes;

use std::sync::Arc;

use boxd_core::{config::BoxdConfig, progress::BackupProvider};
use boxd_scheduler::{BackupRestoreJob, JobManager};
use boxd_system::{AdminCli, PackageIndex, ServiceLauncher, Shield};

pub use button::{ButtonEvent, ButtonRelay};
pub use enable_app::EnableAppJob;
pub use factory_reset::FactoryResetJob;
pub use led::LedJob;
pub use self_update::SelfUpdateJob;
pub use status::{GenericStatusJob, HardwareStatusJob};
pub use trusted_domains::TrustedDomainsJob;

/// Handles to everything outside the process that jobs act on.
#[derive(Clone)]
pub struct Collaborators {
    pub occ: Arc<dyn AdminCli>,
    pub services: Arc<dyn ServiceLauncher>,
    pub packages: Arc<dyn PackageIndex>,
    pub shield: Arc<dyn Shield>,
    pub backup: Arc<dyn BackupProvider>,
}

/// Register every appliance job, in due-check order.
pub fn register_all(manager: &mut JobManager, collab: &Collaborators, config: &BoxdConfig) {
    manager.register(LedJob::new(Arc::clone(&collab.shield)));
    manager.register(FactoryResetJob::new(
        Arc::clone(&collab.shield),
        Arc::clone(&collab.services),
        config.services.factory_reset.clone(),
    ));
    manager.register(BackupRestoreJob::new(Arc::clone(&collab.backup)));
    manager.register(EnableAppJob::new(Arc::clone(&collab.occ)));
    manager.register(SelfUpdateJob::new(
        Arc::clone(&collab.shield),
        Arc::clone(&collab.packages),
        Arc::clone(&collab.services),
        config.services.updater.clone(),
    ));
    manager.register(GenericStatusJob::new(Arc::clone(&collab.packages)));
    manager.register(HardwareStatusJob::new(config.hardware.temperature_path.clone()));
    manager.register(TrustedDomainsJob::new(Arc::clone(&collab.occ)));
}
