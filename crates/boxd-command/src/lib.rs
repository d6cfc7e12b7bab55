//! boxd-command: bounded execution of external programs.
//!
//! Every collaborator the jobs talk to (occ, apt, systemctl, tar) is an
//! external program. [`CommandRunner`] spawns it without a shell, waits with
//! a timeout, kills it when the deadline passes or the caller goes away, and
//! returns ANSI-stripped, size-capped output.
//!
//! ```rust,no_run
//! use boxd_command::{CommandRunner, ExecOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let runner = CommandRunner::new(ExecOptions::default());
//!     let result = runner.run(&["systemctl", "is-active", "ssh"]).await.unwrap();
//!     println!("{}", result.stdout);
//! }
//! ```

pub mod error;
pub mod runner;
pub mod truncate;
pub mod types;

pub use error::{CommandError, Result};
pub use runner::CommandRunner;
pub use types::{ExecOptions, ExecResult};
