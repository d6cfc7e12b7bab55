//! Shared data types for boxd-command.

use serde::{Deserialize, Serialize};

/// Configuration knobs for a single command execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecOptions {
    /// The child is killed if it runs longer than this.
    pub timeout_secs: u64,

    /// Maximum characters kept per output stream.
    ///
    /// Middle-omission truncation is applied: see `truncate::truncate_output`.
    pub max_output_chars: usize,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            max_output_chars: crate::truncate::DEFAULT_MAX_CHARS,
        }
    }
}

impl ExecOptions {
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Outcome of a child that ran to completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecResult {
    /// Process exit code (0 = success, -1 when killed by a signal).
    pub exit_code: i32,

    /// Captured standard output (ANSI escapes already stripped).
    pub stdout: String,

    /// Captured standard error (ANSI escapes already stripped).
    pub stderr: String,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Non-empty, trimmed stdout lines.
    pub fn lines(&self) -> Vec<String> {
        self.stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }
}
