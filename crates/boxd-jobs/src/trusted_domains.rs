use std::sync::Arc;

use async_trait::async_trait;
use boxd_core::config::ApplianceConfig;
use boxd_scheduler::{Job, JobContext, JobError, Recurrence};
use boxd_system::{AdminCli, ConfigValue};
use tracing::{debug, info, warn};

pub const TRUSTED_DOMAINS_JOB: &str = "TrustedDomains";

/// LAN patterns and the mDNS name the appliance is always reachable under.
pub const STATIC_ENTRIES: &[&str] = &[
    "192.168.*.*",
    "10.*.*.*",
    "172.16.*.*",
    "172.18.*.*",
    "nextbox.local",
];

const CHECK_SECS: u64 = 900;
const RETRY_SECS: u64 = 15;
const TRUSTED_DOMAINS_KEY: &str = "trusted_domains";

/// Keeps the content server's `trusted_domains` in line with the appliance
/// settings. Existing entries beyond the first are overwritten, never merged.
pub struct TrustedDomainsJob {
    occ: Arc<dyn AdminCli>,
}

impl TrustedDomainsJob {
    pub fn new(occ: Arc<dyn AdminCli>) -> Self {
        Self { occ }
    }
}

/// Entries the server should trust: its own first entry, the static LAN
/// entries, then the configured and proxy domains when set.
pub fn desired_entries(default_entry: &str, config: &ApplianceConfig) -> Vec<String> {
    let mut entries = vec![default_entry.to_string()];
    entries.extend(STATIC_ENTRIES.iter().map(|e| e.to_string()));

    if let Some(domain) = config.domain.as_deref().filter(|d| !d.is_empty()) {
        entries.push(domain.to_string());
    }
    if config.proxy_active {
        if let Some(proxy) = config.proxy_domain.as_deref().filter(|d| !d.is_empty()) {
            entries.push(proxy.to_string());
        }
    }
    entries
}

#[async_trait]
impl Job for TrustedDomainsJob {
    fn name(&self) -> &str {
        TRUSTED_DOMAINS_JOB
    }

    fn initial_recurrence(&self) -> Recurrence {
        Recurrence::every(90)
    }

    async fn execute(&mut self, ctx: &mut JobContext<'_>) -> Result<(), JobError> {
        ctx.reschedule(Recurrence::every(CHECK_SECS));

        if !self.occ.is_installed() {
            debug!("cannot set trusted domains, content server not installed");
            ctx.reschedule(Recurrence::every(RETRY_SECS));
            return Ok(());
        }

        let current = match self.occ.get_config(TRUSTED_DOMAINS_KEY).await {
            Ok(current) => current,
            Err(e) => {
                warn!(error = %e, "cannot read trusted domains");
                ctx.reschedule(Recurrence::every(RETRY_SECS));
                return Ok(());
            }
        };
        let Some(default_entry) = current.first() else {
            warn!("trusted domains empty, no default entry to keep");
            ctx.reschedule(Recurrence::every(RETRY_SECS));
            return Ok(());
        };

        let entries = desired_entries(default_entry, ctx.config);
        if entries.iter().all(|e| current.contains(e)) {
            return Ok(());
        }

        info!(count = entries.len(), "updating trusted domains");
        if let Err(e) = self
            .occ
            .set_config(TRUSTED_DOMAINS_KEY, &ConfigValue::List(entries), None)
            .await
        {
            warn!(error = %e, "failed to write all trusted domains");
            ctx.reschedule(Recurrence::every(RETRY_SECS));
        }
        Ok(())
    }
}
