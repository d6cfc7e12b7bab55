//! Debian package metadata via apt.

use async_trait::async_trait;
use boxd_command::CommandRunner;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, SystemError};

/// Installed and candidate version of one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageStatus {
    pub name: String,
    pub installed: Option<String>,
    pub candidate: Option<String>,
}

impl PackageStatus {
    pub fn is_installed(&self) -> bool {
        self.installed.is_some()
    }

    /// Installing the candidate would change the installed version.
    pub fn is_upgradable(&self) -> bool {
        match (&self.installed, &self.candidate) {
            (Some(installed), Some(candidate)) => installed != candidate,
            _ => false,
        }
    }
}

#[async_trait]
pub trait PackageIndex: Send + Sync {
    /// Re-download package lists from the configured repositories.
    async fn refresh(&self) -> Result<()>;

    /// `None` when the package is unknown to the index.
    async fn lookup(&self, name: &str) -> Result<Option<PackageStatus>>;
}

pub struct Apt {
    runner: CommandRunner,
}

impl Apt {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl PackageIndex for Apt {
    async fn refresh(&self) -> Result<()> {
        info!("running 'apt-get update'");
        self.runner.run_checked(&["apt-get", "update", "-q"]).await?;
        Ok(())
    }

    async fn lookup(&self, name: &str) -> Result<Option<PackageStatus>> {
        let result = self.runner.run_checked(&["apt-cache", "policy", name]).await?;
        let status = parse_policy(name, &result.stdout)?;
        debug!(package = name, ?status, "apt-cache policy");
        Ok(status)
    }
}

/// Parse `apt-cache policy <name>` output.
///
/// Unknown packages produce no output at all (or only an `N:` notice).
pub fn parse_policy(name: &str, output: &str) -> Result<Option<PackageStatus>> {
    let field = |label: &str| {
        output
            .lines()
            .map(str::trim)
            .find_map(|line| line.strip_prefix(label))
            .map(|v| v.trim().to_string())
    };

    let Some(installed) = field("Installed:") else {
        return Ok(None);
    };
    let candidate = field("Candidate:").ok_or_else(|| SystemError::UnexpectedOutput {
        tool: "apt-cache",
        detail: format!("no candidate line for {name}"),
    })?;

    let version = |v: String| (v != "(none)").then_some(v);
    Ok(Some(PackageStatus {
        name: name.to_string(),
        installed: version(installed),
        candidate: version(candidate),
    }))
}
