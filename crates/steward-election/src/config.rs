//! Election timing parameters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ElectionError, ElectionResult};

/// How long a lease stays valid, how long a leader may go without
/// renewing, and how often every replica retries.
///
/// Must satisfy `lease_duration > renew_deadline > retry_period > 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectionConfig {
    pub lease_name: String,
    pub lease_duration_secs: u64,
    pub renew_deadline_secs: u64,
    pub retry_period_secs: u64,
    /// Clear the lease on shutdown so a successor need not wait for expiry.
    pub release_on_cancel: bool,
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            lease_name: "default".to_string(),
            lease_duration_secs: 15,
            renew_deadline_secs: 10,
            retry_period_secs: 2,
            release_on_cancel: true,
        }
    }
}

impl ElectionConfig {
    pub fn validate(&self) -> ElectionResult<()> {
        if self.lease_name.trim().is_empty() {
            return Err(ElectionError::InvalidConfig(
                "lease_name must not be empty".to_string(),
            ));
        }
        if self.retry_period_secs == 0 {
            return Err(ElectionError::InvalidConfig(
                "retry_period_secs must be greater than zero".to_string(),
            ));
        }
        if self.renew_deadline_secs <= self.retry_period_secs {
            return Err(ElectionError::InvalidConfig(format!(
                "renew_deadline_secs ({}) must be greater than retry_period_secs ({})",
                self.renew_deadline_secs, self.retry_period_secs
            )));
        }
        if self.lease_duration_secs <= self.renew_deadline_secs {
            return Err(ElectionError::InvalidConfig(format!(
                "lease_duration_secs ({}) must be greater than renew_deadline_secs ({})",
                self.lease_duration_secs, self.renew_deadline_secs
            )));
        }
        if i32::try_from(self.lease_duration_secs).is_err() {
            return Err(ElectionError::InvalidConfig(
                "lease_duration_secs does not fit the lease row".to_string(),
            ));
        }
        Ok(())
    }

    pub fn lease_duration(&self) -> Duration {
        Duration::from_secs(self.lease_duration_secs)
    }

    pub fn renew_deadline(&self) -> Duration {
        Duration::from_secs(self.renew_deadline_secs)
    }

    pub fn retry_period(&self) -> Duration {
        Duration::from_secs(self.retry_period_secs)
    }
}
