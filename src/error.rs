// ABOUTME: Application-wide error types for sagedeploy.
// ABOUTME: Uses thiserror for ergonomic error handling.

use thiserror::Error;

use crate::cloud::CloudError;
use crate::deploy::DeployError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error(transparent)]
    Deploy(#[from] DeployError),
}

impl Error {
    /// Process exit code. Setup problems are 1; deployment failures carry
    /// their own codes.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Deploy(e) => e.exit_code(),
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
