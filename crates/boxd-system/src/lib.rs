//! `boxd-system`: the host-side collaborators jobs call into.
//!
//! Each collaborator is a trait (so jobs can be tested against fakes) plus
//! the implementation the daemon wires in:
//!
//! | Trait              | Implementation | Backed by                  |
//! |--------------------|----------------|----------------------------|
//! | [`AdminCli`]       | [`Occ`]        | the content server's `occ` |
//! | [`ServiceLauncher`]| [`Systemd`]    | `systemctl start`          |
//! | [`PackageIndex`]   | [`Apt`]        | `apt-get` / `apt-cache`    |
//! | [`Shield`]         | [`LogShield`]  | log output only            |
//! | `BackupProvider`   | [`TarBackup`]  | `tar`                      |

pub mod backup;
pub mod error;
pub mod occ;
pub mod packages;
pub mod services;
pub mod shield;

pub use backup::TarBackup;
pub use error::{OccError, SystemError};
pub use occ::{AdminCli, ConfigValue, Occ};
pub use packages::{Apt, PackageIndex, PackageStatus};
pub use services::{ServiceLauncher, Systemd};
pub use shield::{LedState, LogShield, Shield};
