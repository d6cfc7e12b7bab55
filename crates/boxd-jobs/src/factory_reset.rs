use std::sync::Arc;

use async_trait::async_trait;
use boxd_scheduler::{Job, JobContext, JobError, Recurrence};
use boxd_system::{LedState, ServiceLauncher, Shield};
use tracing::warn;

pub const FACTORY_RESET_JOB: &str = "FactoryReset";

/// Wipes the appliance. Never scheduled; dispatched when the button is held.
///
/// The reset itself is carried out by a systemd unit so it survives the
/// daemon being stopped halfway through.
pub struct FactoryResetJob {
    shield: Arc<dyn Shield>,
    services: Arc<dyn ServiceLauncher>,
    service: String,
}

impl FactoryResetJob {
    pub fn new(
        shield: Arc<dyn Shield>,
        services: Arc<dyn ServiceLauncher>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            shield,
            services,
            service: service.into(),
        }
    }
}

#[async_trait]
impl Job for FactoryResetJob {
    fn name(&self) -> &str {
        FACTORY_RESET_JOB
    }

    fn initial_recurrence(&self) -> Recurrence {
        Recurrence::Disabled
    }

    async fn execute(&mut self, _ctx: &mut JobContext<'_>) -> Result<(), JobError> {
        warn!(service = %self.service, "starting factory-reset operation");
        self.shield.set_led_state(LedState::FactoryReset);
        self.services
            .start(&self.service)
            .await
            .map_err(|e| JobError::collaborator("starting factory-reset service", e))
    }
}
