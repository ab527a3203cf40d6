// ABOUTME: Model registry trait for listing model packages.
// ABOUTME: Used to resolve a package group to its newest approved version.

use super::HostingError;
use crate::cloud::types::{ApprovalStatus, ModelPackageSummary};
use async_trait::async_trait;

#[async_trait]
pub trait RegistryOps: Send + Sync {
    /// List model package group names.
    async fn list_model_package_groups(&self) -> Result<Vec<String>, HostingError>;

    /// List packages in a group, newest first, optionally filtered by approval status.
    async fn list_model_packages(
        &self,
        group: &str,
        approval: Option<&ApprovalStatus>,
    ) -> Result<Vec<ModelPackageSummary>, HostingError>;
}
