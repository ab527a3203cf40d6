// ABOUTME: Error types for deployment operations.
// ABOUTME: Covers validation, creation, monitoring verdicts, and rollback failures.

use std::time::Duration;

use crate::cloud::HostingError;
use crate::types::EndpointName;

use super::rollback::RollbackError;

/// Errors that end a deployment attempt.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DeployError {
    /// Inputs failed pre-flight checks; nothing was created.
    #[error("invalid deployment request: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// The endpoint does not exist.
    #[error("endpoint '{0}' not found")]
    NotFound(EndpointName),

    /// A retryable service problem that outlived its retries.
    #[error("transient service error: {0}")]
    Transient(String),

    /// The endpoint already exists and no update was requested.
    #[error("endpoint '{0}' already exists; pass --update to roll a new model onto it")]
    EndpointExists(EndpointName),

    /// The endpoint exists but is not in a state that accepts an update.
    #[error("endpoint '{endpoint}' is {status}; updates need it InService")]
    EndpointBusy {
        endpoint: EndpointName,
        status: String,
    },

    /// A create or update request was refused.
    #[error("failed to create {resource}: {source}")]
    CreationFailed {
        resource: String,
        #[source]
        source: HostingError,
    },

    /// The endpoint reached a failed state.
    #[error("deployment of '{endpoint}' failed: {reason}")]
    TerminalDeploymentFailure {
        endpoint: EndpointName,
        reason: String,
        rolled_back: bool,
    },

    /// No terminal status before the deadline.
    #[error("endpoint '{endpoint}' did not reach a terminal state within {}", crate::output::format_duration(.after.as_secs_f64()))]
    Timeout {
        endpoint: EndpointName,
        after: Duration,
    },

    /// Automatic or manual cleanup left resources behind.
    #[error(transparent)]
    Rollback(#[from] RollbackError),
}

impl DeployError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            DeployError::Validation(_) => 2,
            DeployError::EndpointExists(_)
            | DeployError::EndpointBusy { .. }
            | DeployError::CreationFailed { .. } => 3,
            DeployError::Timeout { .. } => 4,
            DeployError::TerminalDeploymentFailure {
                rolled_back: true, ..
            } => 5,
            DeployError::TerminalDeploymentFailure {
                rolled_back: false,
                ..
            } => 6,
            DeployError::Rollback(_) => 7,
            DeployError::NotFound(_) | DeployError::Transient(_) => 1,
        }
    }

    pub(crate) fn creation(resource: impl Into<String>, source: HostingError) -> Self {
        DeployError::CreationFailed {
            resource: resource.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ep() -> EndpointName {
        EndpointName::new("fraud-ep").unwrap()
    }

    #[test]
    fn exit_codes_follow_failure_class() {
        assert_eq!(DeployError::Validation(vec!["bad".into()]).exit_code(), 2);
        assert_eq!(DeployError::EndpointExists(ep()).exit_code(), 3);
        assert_eq!(
            DeployError::Timeout {
                endpoint: ep(),
                after: Duration::from_secs(60)
            }
            .exit_code(),
            4
        );
        let failed = |rolled_back| DeployError::TerminalDeploymentFailure {
            endpoint: ep(),
            reason: "model failed to load".into(),
            rolled_back,
        };
        assert_eq!(failed(true).exit_code(), 5);
        assert_eq!(failed(false).exit_code(), 6);
    }

    #[test]
    fn timeout_message_is_human_readable() {
        let err = DeployError::Timeout {
            endpoint: ep(),
            after: Duration::from_secs(90),
        };
        assert_eq!(
            err.to_string(),
            "endpoint 'fraud-ep' did not reach a terminal state within 1m 30s"
        );
    }
}
