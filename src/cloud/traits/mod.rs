// ABOUTME: Composable capability traits for the cloud backends.
// ABOUTME: Defines EndpointOps, ProvisioningOps, RegistryOps, LogOps, and HostingApi.

mod endpoint;
mod hosting_error;
mod logs;
mod provisioning;
mod registry;

pub use endpoint::EndpointOps;
pub use hosting_error::HostingError;
pub use logs::{LogError, LogOps};
pub use provisioning::ProvisioningOps;
pub use registry::RegistryOps;

/// Everything the deployment flow needs from the hosting service.
pub trait HostingApi: EndpointOps + ProvisioningOps + RegistryOps {}

impl<T: EndpointOps + ProvisioningOps + RegistryOps> HostingApi for T {}
