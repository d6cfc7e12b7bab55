use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 18585;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_CONFIG_PATH: &str = "/etc/boxd/boxd.toml";
/// Package looked up when the configured one is missing from the package index.
pub const FALLBACK_PACKAGE: &str = "nextbox";

/// Top-level config (boxd.toml + BOXD_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoxdConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub appliance: ApplianceConfig,
    #[serde(default)]
    pub occ: OccConfig,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub hardware: HardwareConfig,
    #[serde(default)]
    pub backup: BackupConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// How often the engine asks the job manager for due jobs.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Capacity of the explicit-trigger queue feeding the engine.
    #[serde(default = "default_trigger_buffer")]
    pub trigger_buffer: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            trigger_buffer: default_trigger_buffer(),
        }
    }
}

/// Appliance settings shared with every job body.
///
/// Jobs receive `&mut ApplianceConfig`, so a job may adjust these values for
/// the jobs that run after it. Changes are not written back to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplianceConfig {
    /// Debian package that carries the appliance software.
    #[serde(default = "default_debian_package")]
    pub debian_package: String,
    /// Public domain configured by the owner, if any.
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub proxy_active: bool,
    #[serde(default)]
    pub proxy_domain: Option<String>,
}

impl Default for ApplianceConfig {
    fn default() -> Self {
        Self {
            debian_package: default_debian_package(),
            domain: None,
            proxy_active: false,
            proxy_domain: None,
        }
    }
}

/// How to reach the content server's `occ` admin tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccConfig {
    /// argv prefix; occ sub-commands are appended to it.
    #[serde(default = "default_occ_command")]
    pub command: Vec<String>,
    /// Present while the server has not finished its installation.
    #[serde(default = "default_can_install_path")]
    pub can_install_path: PathBuf,
    #[serde(default = "default_server_config_path")]
    pub config_path: PathBuf,
    #[serde(default = "default_occ_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OccConfig {
    fn default() -> Self {
        Self {
            command: default_occ_command(),
            can_install_path: default_can_install_path(),
            config_path: default_server_config_path(),
            timeout_secs: default_occ_timeout_secs(),
        }
    }
}

/// systemd units started by jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    #[serde(default = "default_updater_service")]
    pub updater: String,
    #[serde(default = "default_factory_reset_service")]
    pub factory_reset: String,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            updater: default_updater_service(),
            factory_reset: default_factory_reset_service(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardwareConfig {
    /// hwmon file holding the SoC temperature in millidegrees.
    #[serde(default = "default_temperature_path")]
    pub temperature_path: PathBuf,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            temperature_path: default_temperature_path(),
        }
    }
}

/// A directory included in full backups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupSource {
    /// Label reported as `who` in progress records.
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    #[serde(default = "default_backup_sources")]
    pub sources: Vec<BackupSource>,
    /// Upper bound for archiving or extracting a single source.
    #[serde(default = "default_backup_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            sources: default_backup_sources(),
            timeout_secs: default_backup_timeout_secs(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_poll_interval_ms() -> u64 {
    1_000
}
fn default_trigger_buffer() -> usize {
    64
}
fn default_debian_package() -> String {
    FALLBACK_PACKAGE.to_string()
}
fn default_occ_command() -> Vec<String> {
    [
        "docker",
        "exec",
        "-u",
        "www-data",
        "nextbox-compose_app_1",
        "/var/www/html/occ",
        "-n",
        "--no-warnings",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_can_install_path() -> PathBuf {
    PathBuf::from("/srv/nextcloud/config/CAN_INSTALL")
}
fn default_server_config_path() -> PathBuf {
    PathBuf::from("/srv/nextcloud/config/config.php")
}
fn default_occ_timeout_secs() -> u64 {
    120
}
fn default_updater_service() -> String {
    "nextbox-updater".to_string()
}
fn default_factory_reset_service() -> String {
    "nextbox-factory-reset".to_string()
}
fn default_temperature_path() -> PathBuf {
    PathBuf::from("/sys/class/hwmon/hwmon0/temp1_input")
}
fn default_backup_sources() -> Vec<BackupSource> {
    [
        ("nextcloud", "/srv/nextcloud"),
        ("database", "/srv/mariadb"),
        ("certificates", "/srv/letsencrypt"),
    ]
    .iter()
    .map(|(name, path)| BackupSource {
        name: name.to_string(),
        path: PathBuf::from(path),
    })
    .collect()
}
fn default_backup_timeout_secs() -> u64 {
    3_600
}

impl BoxdConfig {
    /// Load config from a TOML file with BOXD_* env var overrides.
    ///
    /// Nested keys use a double underscore: `BOXD_HTTP__PORT=9000`.
    /// A missing file is not an error; every field has a default.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path.unwrap_or(DEFAULT_CONFIG_PATH);

        let config: BoxdConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("BOXD_").split("__"))
            .extract()
            .map_err(|e| crate::error::BoxdError::Config(e.to_string()))?;

        Ok(config)
    }
}
