use boxd_command::CommandError;
use thiserror::Error;

/// Failures of the `occ` admin tool wrapper.
///
/// Callers treat `CommandFailed` as opaque: any non-zero exit, timeout or
/// spawn failure of occ ends up here.
#[derive(Debug, Error)]
pub enum OccError {
    #[error("failed to execute occ command: {0}")]
    CommandFailed(#[from] CommandError),

    #[error("unknown occ config key: {0}")]
    UnknownKey(String),

    #[error("invalid value for occ config key {key}: expected {expected}")]
    InvalidValue { key: String, expected: &'static str },
}

/// Failures of the package index and the service launcher.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Command failed: {0}")]
    Command(#[from] CommandError),

    #[error("Unexpected output from {tool}: {detail}")]
    UnexpectedOutput { tool: &'static str, detail: String },
}

pub type Result<T> = std::result::Result<T, SystemError>;
