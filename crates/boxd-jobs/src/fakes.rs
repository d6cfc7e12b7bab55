//! In-memory collaborators and a run harness shared by the job tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use boxd_core::{config::ApplianceConfig, StatusBoard};
use boxd_scheduler::{Job, JobArgs, JobContext, JobError, Recurrence};
use boxd_system::{
    AdminCli, ConfigValue, LedState, OccError, PackageIndex, PackageStatus, ServiceLauncher,
    Shield, SystemError,
};

/// Runs one job body against a private config, board and recurrence.
pub struct Harness {
    pub config: ApplianceConfig,
    pub board: StatusBoard,
    pub recurrence: Recurrence,
}

impl Harness {
    pub fn for_job(job: &dyn Job) -> Self {
        Self {
            config: ApplianceConfig::default(),
            board: StatusBoard::new(),
            recurrence: job.initial_recurrence(),
        }
    }

    pub async fn run(&mut self, job: &mut dyn Job) -> Result<(), JobError> {
        self.run_with(job, &[]).await
    }

    pub async fn run_with(
        &mut self,
        job: &mut dyn Job,
        args: &[(&str, &str)],
    ) -> Result<(), JobError> {
        let args: JobArgs = args
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut ctx = JobContext::new(&mut self.config, &self.board, &args, &mut self.recurrence);
        job.execute(&mut ctx).await
    }
}

fn occ_failure() -> OccError {
    OccError::UnknownKey("simulated failure".into())
}

#[derive(Default)]
pub struct FakeOcc {
    pub not_installed: bool,
    pub fail: bool,
    pub already_enabled: bool,
    pub trusted_domains: Mutex<Vec<String>>,
    pub enabled: Mutex<Vec<String>>,
    pub writes: Mutex<Vec<(String, ConfigValue, Option<usize>)>>,
}

impl FakeOcc {
    pub fn with_domains(domains: &[&str]) -> Self {
        Self {
            trusted_domains: Mutex::new(domains.iter().map(|d| d.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn writes(&self) -> Vec<(String, ConfigValue, Option<usize>)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl AdminCli for FakeOcc {
    fn is_installed(&self) -> bool {
        !self.not_installed
    }

    async fn get_config(&self, key: &str) -> Result<Vec<String>, OccError> {
        if self.fail {
            return Err(occ_failure());
        }
        match key {
            "trusted_domains" => Ok(self.trusted_domains.lock().unwrap().clone()),
            _ => Ok(Vec::new()),
        }
    }

    async fn set_config(
        &self,
        key: &str,
        value: &ConfigValue,
        index: Option<usize>,
    ) -> Result<(), OccError> {
        if self.fail {
            return Err(occ_failure());
        }
        self.writes
            .lock()
            .unwrap()
            .push((key.to_string(), value.clone(), index));
        Ok(())
    }

    async fn enable_app(&self, app: &str) -> Result<bool, OccError> {
        if self.fail {
            return Err(occ_failure());
        }
        self.enabled.lock().unwrap().push(app.to_string());
        Ok(self.already_enabled)
    }
}

#[derive(Default)]
pub struct FakeServices {
    pub started: Mutex<Vec<String>>,
}

impl FakeServices {
    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }
}

#[async_trait]
impl ServiceLauncher for FakeServices {
    async fn start(&self, service: &str) -> boxd_system::error::Result<()> {
        self.started.lock().unwrap().push(service.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakePackages {
    pub fail: bool,
    pub packages: HashMap<String, PackageStatus>,
    pub refreshes: Mutex<u32>,
    pub lookups: Mutex<Vec<String>>,
}

impl FakePackages {
    pub fn with(statuses: &[(&str, Option<&str>, Option<&str>)]) -> Self {
        let packages = statuses
            .iter()
            .map(|(name, installed, candidate)| {
                let status = PackageStatus {
                    name: name.to_string(),
                    installed: installed.map(str::to_string),
                    candidate: candidate.map(str::to_string),
                };
                (name.to_string(), status)
            })
            .collect();
        Self {
            packages,
            ..Self::default()
        }
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl PackageIndex for FakePackages {
    async fn refresh(&self) -> boxd_system::error::Result<()> {
        if self.fail {
            return Err(SystemError::UnexpectedOutput {
                tool: "apt-get",
                detail: "simulated failure".into(),
            });
        }
        *self.refreshes.lock().unwrap() += 1;
        Ok(())
    }

    async fn lookup(&self, name: &str) -> boxd_system::error::Result<Option<PackageStatus>> {
        self.lookups.lock().unwrap().push(name.to_string());
        if self.fail {
            return Err(SystemError::UnexpectedOutput {
                tool: "apt-cache",
                detail: "simulated failure".into(),
            });
        }
        Ok(self.packages.get(name).cloned())
    }
}

#[derive(Default)]
pub struct RecordingShield {
    pub states: Mutex<Vec<LedState>>,
}

impl RecordingShield {
    pub fn states(&self) -> Vec<LedState> {
        self.states.lock().unwrap().clone()
    }
}

impl Shield for RecordingShield {
    fn set_led_state(&self, state: LedState) {
        self.states.lock().unwrap().push(state);
    }
}
