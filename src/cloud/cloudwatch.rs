// ABOUTME: CloudWatch Logs implementation of the log capability trait.
// ABOUTME: Finds endpoint log groups, pages through events, and sets retention.

use async_trait::async_trait;
use aws_sdk_cloudwatchlogs::Client;
use aws_sdk_cloudwatchlogs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};

use super::sagemaker::OptionalField;
use super::traits::{LogError, LogOps};
use super::types::{LogEvent, LogPage, LogQuery};

fn map_sdk_error<E, R>(err: SdkError<E, R>, group: &str) -> LogError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match &err {
        SdkError::ServiceError(ctx) => {
            let service_err = ctx.err();
            LogError::classify(
                service_err.code().unwrap_or("Unknown"),
                service_err.message().unwrap_or_default(),
                group,
            )
        }
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            LogError::Transient(DisplayErrorContext(&err).to_string())
        }
        _ => LogError::Service(DisplayErrorContext(&err).to_string()),
    }
}

/// Log backend over the CloudWatch Logs API.
#[derive(Clone)]
pub struct CloudWatchLogsBackend {
    client: Client,
}

impl CloudWatchLogsBackend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LogOps for CloudWatchLogsBackend {
    async fn log_group_exists(&self, group: &str) -> Result<bool, LogError> {
        let out = self
            .client
            .describe_log_groups()
            .log_group_name_prefix(group)
            .limit(5)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, group))?;

        Ok(out
            .log_groups()
            .optional()
            .unwrap_or_default()
            .iter()
            .any(|g| g.log_group_name().optional() == Some(group)))
    }

    async fn fetch_events(&self, query: &LogQuery) -> Result<LogPage, LogError> {
        let out = self
            .client
            .filter_log_events()
            .log_group_name(&query.group)
            .start_time(query.start_time_ms)
            .limit(query.limit)
            .set_next_token(query.next_token.clone())
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &query.group))?;

        let events = out
            .events()
            .optional()
            .unwrap_or_default()
            .iter()
            .filter_map(|e| {
                Some(LogEvent {
                    stream: e.log_stream_name().optional().unwrap_or_default().to_string(),
                    timestamp_ms: e.timestamp()?,
                    message: e.message().optional()?.trim_end().to_string(),
                })
            })
            .collect();

        Ok(LogPage {
            events,
            next_token: out
                .next_token()
                .optional()
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        })
    }

    async fn set_retention(&self, group: &str, days: i32) -> Result<(), LogError> {
        self.client
            .put_retention_policy()
            .log_group_name(group)
            .retention_in_days(days)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, group))?;
        Ok(())
    }
}
