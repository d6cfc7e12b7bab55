//! `CommandRunner`: spawns an external program, waits with a deadline and
//! collects its output.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::{
    error::{CommandError, Result},
    truncate,
    types::{ExecOptions, ExecResult},
};

/// Runs argv-style commands (no shell involved).
///
/// Cheap to clone; progress streams keep their own copy so they can outlive
/// the job that created them.
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    options: ExecOptions,
}

impl CommandRunner {
    pub fn new(options: ExecOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExecOptions {
        &self.options
    }

    /// A runner sharing these options except for the timeout.
    pub fn with_timeout_secs(&self, secs: u64) -> Self {
        Self {
            options: self.options.clone().with_timeout_secs(secs),
        }
    }

    /// Execute `argv` and return its output whatever the exit code.
    ///
    /// # Errors
    ///
    /// - `EmptyCommand`: `argv` is empty.
    /// - `Spawn`: the program could not be started.
    /// - `Timeout`: the child exceeded `timeout_secs` and was killed.
    /// - `Io`: collecting the output failed.
    pub async fn run<S: AsRef<str>>(&self, argv: &[S]) -> Result<ExecResult> {
        let (program, args) = argv.split_first().ok_or(CommandError::EmptyCommand)?;
        let program = program.as_ref();
        debug!(program, args = ?args.iter().map(AsRef::as_ref).collect::<Vec<_>>(), "exec");

        // kill_on_drop covers both the timeout path below and callers that
        // drop the future mid-flight.
        let child = Command::new(program)
            .args(args.iter().map(AsRef::as_ref))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CommandError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let deadline = Duration::from_secs(self.options.timeout_secs);
        let output = match tokio::time::timeout(deadline, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_elapsed) => {
                warn!(program, timeout_secs = self.options.timeout_secs, "command timed out");
                return Err(CommandError::Timeout {
                    program: program.to_string(),
                    ms: self.options.timeout_secs * 1_000,
                });
            }
        };

        let max = self.options.max_output_chars;
        Ok(ExecResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: truncate::truncate_output(&strip_text(&output.stdout), max),
            stderr: truncate::truncate_output(&strip_text(&output.stderr), max),
        })
    }

    /// Like [`run`](Self::run), but a non-zero exit becomes `NonZeroExit`.
    pub async fn run_checked<S: AsRef<str>>(&self, argv: &[S]) -> Result<ExecResult> {
        let result = self.run(argv).await?;
        if result.success() {
            return Ok(result);
        }

        let program = argv
            .first()
            .map(|p| p.as_ref().to_string())
            .unwrap_or_default();
        let detail = if result.stderr.trim().is_empty() {
            &result.stdout
        } else {
            &result.stderr
        };
        Err(CommandError::NonZeroExit {
            program,
            code: result.exit_code,
            stderr: truncate::tail_lines(detail, 5),
        })
    }
}

fn strip_text(raw: &[u8]) -> String {
    let clean = strip_ansi_escapes::strip(raw);
    String::from_utf8_lossy(&clean).into_owned()
}
