// ABOUTME: Configuration types and parsing for sagedeploy.yml.
// ABOUTME: Layers CLI flags over environment variables over the file over defaults.

mod deserialize;
mod monitor;
mod rollback;

pub use monitor::MonitorConfig;
pub use rollback::RollbackConfig;

use crate::error::{Error, Result};
use crate::types::{InstanceType, RoleArn};
use deserialize::{deserialize_instance_type, deserialize_role_arn};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "sagedeploy.yml";
pub const CONFIG_FILENAME_ALT: &str = "sagedeploy.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".sagedeploy/config.yml";

pub const ENV_REGION: &str = "AWS_REGION";
pub const ENV_EXECUTION_ROLE: &str = "SAGEMAKER_EXECUTION_ROLE_ARN";

pub const DEFAULT_ENDPOINT_PREFIX: &str = "model-ep";

/// Contents of the optional config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub profile: Option<String>,

    #[serde(default, deserialize_with = "deserialize_role_arn")]
    pub execution_role_arn: Option<RoleArn>,

    #[serde(default, deserialize_with = "deserialize_instance_type")]
    pub instance_type: Option<InstanceType>,

    #[serde(default)]
    pub endpoint_prefix: Option<String>,

    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub rollback: RollbackConfig,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.monitor.validate().map_err(Error::InvalidConfig)?;
        if config.rollback.verify_attempts == 0 {
            return Err(Error::InvalidConfig(
                "rollback.verify_attempts must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load the first config file found in `dir`, or defaults when there is none.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading config file");
                return Self::load(path);
            }
        }

        tracing::debug!(dir = %dir.display(), "no config file, using defaults");
        Ok(Self::default())
    }
}

/// Values given on the command line; these win over everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub timeout: Option<Duration>,
    pub poll_interval: Option<Duration>,
}

/// Fully layered settings for one command run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub region: Option<String>,
    pub profile: Option<String>,
    /// Unvalidated; deploy pre-flight checks it.
    pub execution_role_arn: Option<String>,
    pub instance_type: InstanceType,
    pub endpoint_prefix: String,
    pub monitor: MonitorConfig,
    pub rollback: RollbackConfig,
}

impl Settings {
    /// Layer `overrides` over `env` over `file` over defaults.
    pub fn resolve(
        file: Config,
        overrides: &Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let env_var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let mut monitor = file.monitor;
        if let Some(timeout) = overrides.timeout {
            monitor.timeout = timeout;
        }
        if let Some(poll_interval) = overrides.poll_interval {
            monitor.poll_interval = poll_interval;
        }
        monitor.validate().map_err(Error::InvalidConfig)?;

        Ok(Settings {
            region: overrides
                .region
                .clone()
                .or_else(|| env_var(ENV_REGION))
                .or(file.region),
            profile: overrides.profile.clone().or(file.profile),
            execution_role_arn: env_var(ENV_EXECUTION_ROLE)
                .or_else(|| file.execution_role_arn.map(|arn| arn.to_string())),
            instance_type: file.instance_type.unwrap_or_default(),
            endpoint_prefix: file
                .endpoint_prefix
                .unwrap_or_else(|| DEFAULT_ENDPOINT_PREFIX.to_string()),
            monitor,
            rollback: file.rollback,
        })
    }

    /// Resolve against the process environment.
    pub fn from_env(file: Config, overrides: &Overrides) -> Result<Self> {
        Self::resolve(file, overrides, |key| std::env::var(key).ok())
    }
}
