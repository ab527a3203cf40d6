// ABOUTME: Rollback verification configuration.
// ABOUTME: How often to confirm an endpoint is gone and how long to wait for an update to settle.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RollbackConfig {
    #[serde(default = "default_verify_attempts")]
    pub verify_attempts: u32,

    #[serde(default = "default_verify_interval", with = "humantime_serde")]
    pub verify_interval: Duration,

    /// How long rollback waits for an updated endpoint to leave a
    /// transitional state before switching it back.
    #[serde(default = "default_settle_timeout", with = "humantime_serde")]
    pub settle_timeout: Duration,
}

fn default_verify_attempts() -> u32 {
    3
}

fn default_verify_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_settle_timeout() -> Duration {
    Duration::from_secs(10 * 60)
}

impl Default for RollbackConfig {
    fn default() -> Self {
        RollbackConfig {
            verify_attempts: default_verify_attempts(),
            verify_interval: default_verify_interval(),
            settle_timeout: default_settle_timeout(),
        }
    }
}
