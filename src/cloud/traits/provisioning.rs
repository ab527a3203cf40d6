// ABOUTME: Model and endpoint configuration operations for the hosting service.
// ABOUTME: The resources an endpoint is built from, created before and deleted after it.

use super::HostingError;
use crate::cloud::types::{EndpointConfigDescription, EndpointConfigSpec, ModelSpec};
use crate::types::{EndpointConfigName, ModelName};
use async_trait::async_trait;

#[async_trait]
pub trait ProvisioningOps: Send + Sync {
    async fn create_model(&self, spec: &ModelSpec) -> Result<(), HostingError>;

    async fn delete_model(&self, name: &ModelName) -> Result<(), HostingError>;

    async fn create_endpoint_config(&self, spec: &EndpointConfigSpec) -> Result<(), HostingError>;

    async fn describe_endpoint_config(
        &self,
        name: &EndpointConfigName,
    ) -> Result<EndpointConfigDescription, HostingError>;

    async fn delete_endpoint_config(&self, name: &EndpointConfigName)
    -> Result<(), HostingError>;
}
