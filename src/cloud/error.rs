// ABOUTME: Cloud error types with SNAFU pattern.
// ABOUTME: Unifies session, hosting, and log errors behind one type for the command layer.

use snafu::Snafu;

use super::session::SessionError;
use super::traits::{HostingError, LogError};

/// Unified error for session setup and backend calls.
///
/// Built with the generated context selectors, e.g.
/// `hosting.describe_endpoint(&name).await.context(HostingSnafu)?`.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CloudError {
    #[snafu(display("AWS session setup failed: {source}"))]
    Session { source: SessionError },

    #[snafu(display("SageMaker request failed: {source}"))]
    Hosting { source: HostingError },

    #[snafu(display("CloudWatch Logs request failed: {source}"))]
    Logs { source: LogError },
}
