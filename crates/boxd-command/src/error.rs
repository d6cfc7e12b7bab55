//! Error types for the boxd-command crate.

use thiserror::Error;

/// All errors that can originate from running an external program.
#[derive(Debug, Error)]
pub enum CommandError {
    /// An empty argv was supplied.
    #[error("Empty command line")]
    EmptyCommand,

    /// The child process could not be spawned.
    #[error("Failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Underlying I/O failure while collecting output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The child exceeded its time budget and was killed.
    #[error("`{program}` timed out after {ms}ms")]
    Timeout { program: String, ms: u64 },

    /// The child ran to completion but reported failure.
    #[error("`{program}` exited with code {code}: {stderr}")]
    NonZeroExit {
        program: String,
        code: i32,
        stderr: String,
    },
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, CommandError>;
