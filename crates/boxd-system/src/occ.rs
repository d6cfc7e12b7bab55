//! Administration of the content server through its `occ` command-line tool.

use std::path::PathBuf;

use async_trait::async_trait;
use boxd_command::{CommandRunner, ExecOptions};
use boxd_core::config::OccConfig;
use tracing::{debug, warn};

use crate::error::OccError;

/// Config keys holding a single string.
pub const CONFIG_VALUE_KEYS: &[&str] = &[
    "overwritehost",
    "overwriteprotocol",
    "overwritewebroot",
    "overwritecondaddr",
];

/// Config keys holding an indexed list.
pub const CONFIG_LIST_KEYS: &[&str] = &["trusted_domains", "trusted_proxies"];

/// Value written by [`AdminCli::set_config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Text(String),
    List(Vec<String>),
}

/// The subset of occ operations jobs depend on.
#[async_trait]
pub trait AdminCli: Send + Sync {
    /// False until the server's web installer has been completed.
    fn is_installed(&self) -> bool;

    /// Value of a system config key, one entry per output line.
    async fn get_config(&self, key: &str) -> Result<Vec<String>, OccError>;

    /// Write a system config key.
    ///
    /// For list keys `index` is the position of the first written item
    /// (default 0); value keys ignore it.
    async fn set_config(
        &self,
        key: &str,
        value: &ConfigValue,
        index: Option<usize>,
    ) -> Result<(), OccError>;

    /// Enable `app`; returns true when occ reports it was already enabled.
    async fn enable_app(&self, app: &str) -> Result<bool, OccError>;
}

/// `occ` invoked through the configured argv prefix (usually `docker exec`).
pub struct Occ {
    command: Vec<String>,
    can_install_path: PathBuf,
    config_path: PathBuf,
    runner: CommandRunner,
}

impl Occ {
    pub fn new(config: &OccConfig) -> Self {
        Self {
            command: config.command.clone(),
            can_install_path: config.can_install_path.clone(),
            config_path: config.config_path.clone(),
            runner: CommandRunner::new(ExecOptions::default().with_timeout_secs(config.timeout_secs)),
        }
    }

    /// Run an occ sub-command and return its non-empty output lines.
    pub async fn run_cmd(&self, args: &[&str]) -> Result<Vec<String>, OccError> {
        let mut argv: Vec<&str> = self.command.iter().map(String::as_str).collect();
        argv.extend_from_slice(args);

        match self.runner.run_checked(&argv).await {
            Ok(result) => Ok(result.lines()),
            Err(e) => {
                warn!(args = ?args, error = %e, "occ command failed");
                Err(OccError::CommandFailed(e))
            }
        }
    }

    /// Server version components parsed from `occ status`.
    pub async fn version(&self) -> Result<Option<Vec<u32>>, OccError> {
        let output = self.run_cmd(&["status"]).await?;
        Ok(output
            .iter()
            .find(|line| line.contains("- version:"))
            .and_then(|line| line.rsplit(':').next())
            .map(|v| {
                v.trim()
                    .split('.')
                    .filter_map(|part| part.parse().ok())
                    .collect()
            }))
    }

    /// Whether `config.php` has maintenance mode switched on.
    pub fn is_maintenance(&self) -> bool {
        let Ok(content) = std::fs::read_to_string(&self.config_path) else {
            return false;
        };
        content
            .lines()
            .find(|line| line.contains("maintenance"))
            .is_some_and(|line| line.contains("true"))
    }

    pub async fn delete_config(&self, key: &str) -> Result<(), OccError> {
        self.run_cmd(&["config:system:delete", key]).await?;
        Ok(())
    }

    pub async fn set_maintenance(&self, on: bool) -> Result<(), OccError> {
        let flag = if on { "--on" } else { "--off" };
        self.run_cmd(&["maintenance:mode", flag]).await?;
        debug!(on, "maintenance mode switched");
        Ok(())
    }

    /// Leave maintenance mode and disable apps known to break a fresh start.
    pub async fn soft_reset(&self) -> Result<(), OccError> {
        self.set_maintenance(false).await?;
        self.run_cmd(&["app:disable", "mail"]).await?;
        Ok(())
    }
}

#[async_trait]
impl AdminCli for Occ {
    fn is_installed(&self) -> bool {
        !self.can_install_path.exists()
    }

    async fn get_config(&self, key: &str) -> Result<Vec<String>, OccError> {
        self.run_cmd(&["config:system:get", key]).await
    }

    async fn set_config(
        &self,
        key: &str,
        value: &ConfigValue,
        index: Option<usize>,
    ) -> Result<(), OccError> {
        if CONFIG_LIST_KEYS.contains(&key) {
            let items: &[String] = match value {
                ConfigValue::Text(item) => std::slice::from_ref(item),
                ConfigValue::List(items) => items,
            };
            let start = index.unwrap_or(0);
            for (offset, item) in items.iter().enumerate() {
                let idx = (start + offset).to_string();
                self.run_cmd(&["config:system:set", key, &idx, "--value", item])
                    .await?;
            }
            Ok(())
        } else if CONFIG_VALUE_KEYS.contains(&key) {
            let ConfigValue::Text(text) = value else {
                return Err(OccError::InvalidValue {
                    key: key.to_string(),
                    expected: "a single string",
                });
            };
            self.run_cmd(&["config:system:set", key, "--type", "string", "--value", text])
                .await?;
            Ok(())
        } else {
            Err(OccError::UnknownKey(key.to_string()))
        }
    }

    async fn enable_app(&self, app: &str) -> Result<bool, OccError> {
        let output = self.run_cmd(&["app:enable", app]).await?;
        Ok(output.join(" ").contains("already"))
    }
}
