// ABOUTME: Cloud service abstraction layer.
// ABOUTME: Capability traits with SageMaker and CloudWatch Logs implementations.

mod cloudwatch;
mod console;
mod error;
mod sagemaker;
mod session;
mod traits;
mod types;

pub use cloudwatch::CloudWatchLogsBackend;
pub use console::{endpoint_console_url, log_group_console_url, log_group_name};
pub use error::{CloudError, HostingSnafu, LogsSnafu, SessionSnafu};
pub use sagemaker::SageMakerBackend;
pub use session::{AwsSession, CredentialSource, SessionError};
pub use traits::{
    EndpointOps, HostingApi, HostingError, LogError, LogOps, ProvisioningOps, RegistryOps,
};
pub use types::*;
