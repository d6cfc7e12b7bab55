use std::sync::Arc;

use async_trait::async_trait;
use boxd_scheduler::{Job, JobContext, JobError, Recurrence};
use boxd_system::{LedState, Shield};

pub const LED_JOB: &str = "LED";

/// Switches the LED to `ready` shortly after startup, then never runs again.
pub struct LedJob {
    shield: Arc<dyn Shield>,
}

impl LedJob {
    pub fn new(shield: Arc<dyn Shield>) -> Self {
        Self { shield }
    }
}

#[async_trait]
impl Job for LedJob {
    fn name(&self) -> &str {
        LED_JOB
    }

    fn initial_recurrence(&self) -> Recurrence {
        Recurrence::every(1)
    }

    async fn execute(&mut self, ctx: &mut JobContext<'_>) -> Result<(), JobError> {
        self.shield.set_led_state(LedState::Ready);
        ctx.disable();
        Ok(())
    }
}
