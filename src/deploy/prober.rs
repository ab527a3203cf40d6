// ABOUTME: Status prober for a named endpoint.
// ABOUTME: One describe call per probe, with errors sorted into not-found, transient, and fatal.

use crate::cloud::{EndpointDescription, EndpointOps, HostingError};
use crate::types::EndpointName;

/// Why a probe produced no description.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("endpoint '{0}' not found")]
    NotFound(EndpointName),

    #[error("{0}")]
    Transient(String),

    #[error("{0}")]
    Fatal(String),
}

/// Queries the current state of an endpoint. Holds no state between probes.
pub struct StatusProber<'a, E: EndpointOps + ?Sized> {
    api: &'a E,
}

impl<'a, E: EndpointOps + ?Sized> StatusProber<'a, E> {
    pub fn new(api: &'a E) -> Self {
        Self { api }
    }

    pub async fn probe(&self, endpoint: &EndpointName) -> Result<EndpointDescription, ProbeError> {
        self.api
            .describe_endpoint(endpoint)
            .await
            .map_err(|e| match e {
                HostingError::NotFound(_) => ProbeError::NotFound(endpoint.clone()),
                HostingError::Transient(msg) => ProbeError::Transient(msg),
                other => ProbeError::Fatal(other.to_string()),
            })
    }
}
