// ABOUTME: Progress sink the deployment flow reports to while it runs.
// ABOUTME: Implemented by the CLI output layer; every hook defaults to a no-op.

use std::time::Duration;

use crate::cloud::EndpointStatus;
use crate::types::EndpointName;

use super::tailer::LogRecord;

pub trait ProgressSink: Send + Sync {
    /// A deployment step is starting.
    fn step(&self, _message: &str) {}

    /// Something non-fatal the operator should see.
    fn warning(&self, _message: &str) {}

    fn status_changed(&self, _endpoint: &EndpointName, _status: &EndpointStatus, _elapsed: Duration) {
    }

    fn failure_reason(&self, _reason: &str) {}

    fn log_stream_found(&self, _group: &str) {}

    fn log_record(&self, _record: &LogRecord) {}
}

/// Discards all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {}
