//! Front-panel button handling.
//!
//! Button edges are not jobs with their own schedule. Presses only change
//! the LED; holding the button asks the engine to dispatch the factory-reset
//! job, so the reset runs under the same fault isolation as every other job.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use boxd_scheduler::{JobArgs, SchedulerError, SchedulerHandle};
use boxd_system::{LedState, Shield};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::factory_reset::FACTORY_RESET_JOB;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonEvent {
    Pressed,
    Released,
    Held,
}

impl fmt::Display for ButtonEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ButtonEvent::Pressed => "pressed",
            ButtonEvent::Released => "released",
            ButtonEvent::Held => "held",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ButtonEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pressed" => Ok(ButtonEvent::Pressed),
            "released" => Ok(ButtonEvent::Released),
            "held" => Ok(ButtonEvent::Held),
            other => Err(format!("unknown button event: {other}")),
        }
    }
}

/// Turns button edges into LED changes and factory-reset triggers.
#[derive(Clone)]
pub struct ButtonRelay {
    shield: Arc<dyn Shield>,
    scheduler: SchedulerHandle,
}

impl ButtonRelay {
    pub fn new(shield: Arc<dyn Shield>, scheduler: SchedulerHandle) -> Self {
        Self { shield, scheduler }
    }

    pub async fn handle(&self, event: ButtonEvent) -> Result<(), SchedulerError> {
        match event {
            ButtonEvent::Pressed => self.shield.set_led_state(LedState::Button),
            ButtonEvent::Released => self.shield.set_led_state(LedState::Ready),
            ButtonEvent::Held => {
                warn!("button held, requesting factory reset");
                self.scheduler
                    .trigger(FACTORY_RESET_JOB, JobArgs::new())
                    .await?;
            }
        }
        info!(%event, "button event handled");
        Ok(())
    }
}
