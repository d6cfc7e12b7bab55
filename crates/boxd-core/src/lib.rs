//! `boxd-core`: types shared by every boxd crate.
//!
//! - [`config`]: layered TOML + env configuration.
//! - [`board`]: the status board jobs publish into and the HTTP API reads.
//! - [`progress`]: progress records emitted by long-running operations.

pub mod board;
pub mod config;
pub mod error;
pub mod progress;

pub use board::StatusBoard;
pub use config::BoxdConfig;
pub use error::{BoxdError, Result};
pub use progress::{BackupMode, BackupProvider, Progress, ProgressStream};
