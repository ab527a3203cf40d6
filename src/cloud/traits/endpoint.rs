// ABOUTME: Endpoint lifecycle trait for the hosting service.
// ABOUTME: Create, update, describe, and delete a named endpoint.

use super::HostingError;
use crate::cloud::types::EndpointDescription;
use crate::types::{EndpointConfigName, EndpointName};
use async_trait::async_trait;

/// Endpoint lifecycle operations.
#[async_trait]
pub trait EndpointOps: Send + Sync {
    /// Describe an endpoint. Returns `HostingError::NotFound` if it doesn't exist.
    async fn describe_endpoint(
        &self,
        name: &EndpointName,
    ) -> Result<EndpointDescription, HostingError>;

    /// Request creation of a new endpoint bound to `config`.
    async fn create_endpoint(
        &self,
        name: &EndpointName,
        config: &EndpointConfigName,
    ) -> Result<(), HostingError>;

    /// Re-point an existing endpoint at a new configuration.
    async fn update_endpoint(
        &self,
        name: &EndpointName,
        config: &EndpointConfigName,
    ) -> Result<(), HostingError>;

    /// Request deletion of an endpoint.
    async fn delete_endpoint(&self, name: &EndpointName) -> Result<(), HostingError>;
}
