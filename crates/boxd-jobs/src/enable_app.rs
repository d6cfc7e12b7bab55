use std::sync::Arc;

use async_trait::async_trait;
use boxd_scheduler::{Job, JobContext, JobError, Recurrence};
use boxd_system::AdminCli;
use tracing::{debug, info, warn};

pub const ENABLE_APP_JOB: &str = "EnableNextBoxApp";
/// Companion app providing the appliance pages inside the content server.
pub const COMPANION_APP: &str = "nextbox";

const RETRY_SECS: u64 = 5;
const ENABLED_SECS: u64 = 3600;

/// Keeps the companion app enabled in the content server.
///
/// Retries every few seconds until occ reports the app as already enabled,
/// then only checks hourly.
pub struct EnableAppJob {
    occ: Arc<dyn AdminCli>,
}

impl EnableAppJob {
    pub fn new(occ: Arc<dyn AdminCli>) -> Self {
        Self { occ }
    }
}

#[async_trait]
impl Job for EnableAppJob {
    fn name(&self) -> &str {
        ENABLE_APP_JOB
    }

    fn initial_recurrence(&self) -> Recurrence {
        Recurrence::every(RETRY_SECS)
    }

    async fn execute(&mut self, ctx: &mut JobContext<'_>) -> Result<(), JobError> {
        if !self.occ.is_installed() {
            debug!("cannot enable companion app, content server not installed");
            return Ok(());
        }

        match self.occ.enable_app(COMPANION_APP).await {
            Ok(true) => {
                info!(app = COMPANION_APP, "companion app enabled");
                ctx.reschedule(Recurrence::every(ENABLED_SECS));
            }
            Ok(false) => debug!(app = COMPANION_APP, "enable requested, not confirmed yet"),
            Err(e) => warn!(app = COMPANION_APP, error = %e, "enabling companion app failed"),
        }
        Ok(())
    }
}
