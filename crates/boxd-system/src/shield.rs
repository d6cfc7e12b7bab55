//! Front-panel LED signalling.

use serde::{Deserialize, Serialize};
use tracing::info;

/// What the status LED communicates to someone standing next to the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LedState {
    Ready,
    Button,
    Updating,
    FactoryReset,
}

impl std::fmt::Display for LedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LedState::Ready => "ready",
            LedState::Button => "button",
            LedState::Updating => "updating",
            LedState::FactoryReset => "factory-reset",
        };
        write!(f, "{s}")
    }
}

pub trait Shield: Send + Sync {
    fn set_led_state(&self, state: LedState);
}

/// Shield for hosts without the LED board attached: state changes are logged.
#[derive(Debug, Default)]
pub struct LogShield;

impl Shield for LogShield {
    fn set_led_state(&self, state: LedState) {
        info!(led = %state, "led state changed");
    }
}
