//! Inspector scheduling configuration.

use std::time::Duration;

use super::parse::{env_duration, env_or};
use super::ConfigError;
use crate::health::DEFAULT_CHECK_PERIOD;

/// Default bound on waiting for the polling loop to stop.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Polling configuration loaded from environment.
#[derive(Clone, Debug)]
pub struct HealthConfig {
    /// Interval between poll cycles (HEALTHZ_CHECK_PERIOD).
    pub check_period: Duration,
    /// How long shutdown waits for the loop (HEALTHZ_SHUTDOWN_TIMEOUT).
    pub shutdown_timeout: Duration,
}

impl HealthConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let check_period = env_duration("HEALTHZ_CHECK_PERIOD", "15s")?.ok_or_else(|| {
            ConfigError::Invalid {
                key: "HEALTHZ_CHECK_PERIOD".into(),
                message: format!(
                    "'{}' disables polling, use a positive duration",
                    env_or("HEALTHZ_CHECK_PERIOD", "")
                ),
            }
        })?;

        // "off" means do not wait for the loop at all
        let shutdown_timeout =
            env_duration("HEALTHZ_SHUTDOWN_TIMEOUT", "5s")?.unwrap_or(Duration::ZERO);

        Ok(Self {
            check_period,
            shutdown_timeout,
        })
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            check_period: DEFAULT_CHECK_PERIOD,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}
