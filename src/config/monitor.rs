// ABOUTME: Deployment monitor timing configuration.
// ABOUTME: Overall timeout, status poll cadence, and log tailing cadence with defaults.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    /// Give up waiting for a terminal status after this long.
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Fetch cadence right after log records arrive.
    #[serde(default = "default_log_poll_interval", with = "humantime_serde")]
    pub log_poll_interval: Duration,

    /// Ceiling for the fetch cadence while the log group is quiet.
    #[serde(default = "default_log_poll_max_interval", with = "humantime_serde")]
    pub log_poll_max_interval: Duration,

    #[serde(default = "default_log_discovery_interval", with = "humantime_serde")]
    pub log_discovery_interval: Duration,

    /// How far before the first fetch to start reading.
    #[serde(default = "default_log_lookback", with = "humantime_serde")]
    pub log_lookback: Duration,

    #[serde(default = "default_log_page_limit")]
    pub log_page_limit: i32,

    #[serde(default = "default_log_max_pages")]
    pub log_max_pages: usize,

    /// Retention applied to the endpoint log group; `null` leaves it alone.
    #[serde(default = "default_log_retention_days")]
    pub log_retention_days: Option<i32>,
}

fn default_timeout() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_log_poll_interval() -> Duration {
    Duration::from_secs(3)
}

fn default_log_poll_max_interval() -> Duration {
    Duration::from_secs(15)
}

fn default_log_discovery_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_log_lookback() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_log_page_limit() -> i32 {
    100
}

fn default_log_max_pages() -> usize {
    10
}

fn default_log_retention_days() -> Option<i32> {
    Some(1)
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
            log_poll_interval: default_log_poll_interval(),
            log_poll_max_interval: default_log_poll_max_interval(),
            log_discovery_interval: default_log_discovery_interval(),
            log_lookback: default_log_lookback(),
            log_page_limit: default_log_page_limit(),
            log_max_pages: default_log_max_pages(),
            log_retention_days: default_log_retention_days(),
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout.is_zero() {
            return Err("monitor.timeout must be greater than zero".to_string());
        }
        if self.poll_interval.is_zero() {
            return Err("monitor.poll_interval must be greater than zero".to_string());
        }
        if self.log_poll_interval.is_zero() || self.log_discovery_interval.is_zero() {
            return Err("log polling intervals must be greater than zero".to_string());
        }
        if self.log_poll_max_interval < self.log_poll_interval {
            return Err(
                "monitor.log_poll_max_interval must be at least monitor.log_poll_interval"
                    .to_string(),
            );
        }
        if !(1..=10_000).contains(&self.log_page_limit) {
            return Err("monitor.log_page_limit must be between 1 and 10000".to_string());
        }
        if self.log_max_pages == 0 {
            return Err("monitor.log_max_pages must be at least 1".to_string());
        }
        Ok(())
    }
}
