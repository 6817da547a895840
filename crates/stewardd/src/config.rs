//! Daemon configuration.
//!
//! Resolved in three layers: built-in defaults, then an optional TOML file,
//! then CLI flags and environment variables.
//!
//! ```toml
//! identity = "replica-0"          # optional, random otherwise
//!
//! [election]
//! lease_name = "default"
//! lease_duration_secs = 15
//! renew_deadline_secs = 10
//! retry_period_secs = 2
//!
//! [scheduler]
//! tick_interval_secs = 10
//! endpoint_trigger = false
//! endpoint_secret = ""
//!
//! [[jobs]]
//! name = "expire-sessions"
//! schedule = "*/5 * * * *"        # omit to run on every tick
//! sql = "DELETE FROM sessions WHERE expires_at < now()"
//! ```

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use steward_election::ElectionConfig;
use steward_scheduler::{CronSchedule, TriggerConfig};

/// One maintenance job: a SQL statement run against the service database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlJobConfig {
    pub name: String,
    /// Cron expression. `None` runs the job on every leader tick.
    #[serde(default)]
    pub schedule: Option<String>,
    pub sql: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub identity: Option<String>,
    pub election: ElectionConfig,
    pub scheduler: TriggerConfig,
    pub jobs: Vec<SqlJobConfig>,
}

/// Values that take precedence over the file, from flags or environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub identity: Option<String>,
    pub lease_name: Option<String>,
    pub endpoint_trigger: Option<bool>,
    pub endpoint_secret: Option<String>,
    pub trigger_lease_guard: Option<bool>,
    pub tick_interval_secs: Option<u64>,
}

impl DaemonConfig {
    /// Defaults, or the TOML file at `path` on top of them.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(identity) = overrides.identity {
            self.identity = Some(identity);
        }
        if let Some(lease_name) = overrides.lease_name {
            self.election.lease_name = lease_name;
        }
        if let Some(enabled) = overrides.endpoint_trigger {
            self.scheduler.endpoint_trigger = enabled;
        }
        if let Some(secret) = overrides.endpoint_secret {
            self.scheduler.endpoint_secret = secret;
        }
        if let Some(guard) = overrides.trigger_lease_guard {
            self.scheduler.trigger_lease_guard = guard;
        }
        if let Some(secs) = overrides.tick_interval_secs {
            self.scheduler.tick_interval_secs = secs;
        }
        self
    }

    /// Fail fast on anything that would misbehave at runtime.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.election.validate()?;
        self.scheduler.validate()?;
        if self.identity.as_deref().is_some_and(|id| id.trim().is_empty()) {
            bail!("identity must not be blank");
        }

        let mut seen = HashSet::new();
        for job in &self.jobs {
            if job.name.trim().is_empty() {
                bail!("job name must not be empty");
            }
            if !seen.insert(job.name.as_str()) {
                bail!("duplicate job name: {}", job.name);
            }
            if job.sql.trim().is_empty() {
                bail!("job {} has no sql", job.name);
            }
            if let Some(expr) = &job.schedule {
                CronSchedule::parse(expr).map_err(|e| {
                    anyhow::anyhow!("job {}: invalid schedule {expr:?}: {e}", job.name)
                })?;
            }
        }
        Ok(())
    }
}
