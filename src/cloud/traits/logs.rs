// ABOUTME: Log backend trait for endpoint log groups.
// ABOUTME: Group discovery, paged event fetches, and retention policy.

use crate::cloud::types::{LogPage, LogQuery};
use async_trait::async_trait;

/// Log group operations.
#[async_trait]
pub trait LogOps: Send + Sync {
    /// Whether the named log group exists yet.
    async fn log_group_exists(&self, group: &str) -> Result<bool, LogError>;

    /// Fetch one page of events at or after `query.start_time_ms`.
    async fn fetch_events(&self, query: &LogQuery) -> Result<LogPage, LogError>;

    /// Set the retention policy of a log group, in days.
    async fn set_retention(&self, group: &str, days: i32) -> Result<(), LogError>;
}

/// Errors from log operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogError {
    #[error("log group not found: {0}")]
    GroupNotFound(String),

    #[error("transient log service error: {0}")]
    Transient(String),

    #[error("log service error: {0}")]
    Service(String),
}

impl LogError {
    pub fn classify(code: &str, message: &str, group: &str) -> Self {
        match code {
            "ResourceNotFoundException" => LogError::GroupNotFound(group.to_string()),
            "ThrottlingException" | "ServiceUnavailableException" | "LimitExceededException" => {
                LogError::Transient(format!("{code}: {message}"))
            }
            _ => LogError::Service(format!("{code}: {message}")),
        }
    }
}
