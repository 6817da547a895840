//! How jobs get triggered: the leader's internal tick, or an external
//! caller hitting the schedule endpoint.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SchedulerError, SchedulerResult};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Seconds between leader ticks.
    pub tick_interval_secs: u64,
    /// Disable the internal timer and run jobs only when the endpoint is called.
    pub endpoint_trigger: bool,
    /// Shared secret expected on endpoint calls.
    pub endpoint_secret: String,
    /// Make endpoint calls win the lease before running work.
    pub trigger_lease_guard: bool,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 10,
            endpoint_trigger: false,
            endpoint_secret: String::new(),
            trigger_lease_guard: false,
        }
    }
}

impl fmt::Debug for TriggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secret = if self.endpoint_secret.is_empty() {
            ""
        } else {
            "<redacted>"
        };
        f.debug_struct("TriggerConfig")
            .field("tick_interval_secs", &self.tick_interval_secs)
            .field("endpoint_trigger", &self.endpoint_trigger)
            .field("endpoint_secret", &secret)
            .field("trigger_lease_guard", &self.trigger_lease_guard)
            .finish()
    }
}

impl TriggerConfig {
    pub fn validate(&self) -> SchedulerResult<()> {
        if self.tick_interval_secs == 0 {
            return Err(SchedulerError::InvalidConfig(
                "tick_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.endpoint_trigger && self.endpoint_secret.trim().is_empty() {
            return Err(SchedulerError::InvalidConfig(
                "endpoint_secret must be set when endpoint_trigger is enabled, \
                 otherwise anyone could run the scheduler"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_timer_mode() {
        let config = TriggerConfig::default();
        config.validate().unwrap();
        assert!(!config.endpoint_trigger);
        assert_eq!(config.tick_interval(), Duration::from_secs(10));
    }

    #[test]
    fn endpoint_mode_requires_secret() {
        let config = TriggerConfig {
            endpoint_trigger: true,
            endpoint_secret: "  ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SchedulerError::InvalidConfig(_))
        ));

        let config = TriggerConfig {
            endpoint_secret: "s3cret".to_string(),
            ..config
        };
        config.validate().unwrap();
    }

    #[test]
    fn debug_hides_secret() {
        let config = TriggerConfig {
            endpoint_secret: "s3cret".to_string(),
            ..Default::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }
}
