// ABOUTME: Observed lifecycle state of the endpoint under deployment.
// ABOUTME: Created at request time and updated only from status probe results.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cloud::{EndpointDescription, EndpointStatus};
use crate::types::{EndpointConfigName, EndpointName};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointState {
    pub endpoint: EndpointName,
    /// Configuration the deployment asked the endpoint to run.
    pub desired_config: Option<EndpointConfigName>,
    /// Last status seen; `None` until the endpoint is first observed.
    pub status: Option<EndpointStatus>,
    /// Configuration currently bound according to the service.
    pub bound_config: Option<String>,
    pub failure_reason: Option<String>,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_polled: Option<DateTime<Utc>>,
}

impl EndpointState {
    pub fn new(endpoint: EndpointName, desired_config: Option<EndpointConfigName>) -> Self {
        Self {
            endpoint,
            desired_config,
            status: None,
            bound_config: None,
            failure_reason: None,
            first_seen: None,
            last_polled: None,
        }
    }

    /// Fold in a probe result. Returns true when the status changed.
    pub fn record(&mut self, description: &EndpointDescription, at: DateTime<Utc>) -> bool {
        self.first_seen.get_or_insert(at);
        self.last_polled = Some(at);
        self.bound_config = description.config_name.clone();
        self.failure_reason = description.failure_reason.clone();

        let changed = self.status.as_ref() != Some(&description.status);
        self.status = Some(description.status.clone());
        changed
    }

    /// Note a poll that didn't find the endpoint.
    pub fn record_missing(&mut self, at: DateTime<Utc>) {
        self.last_polled = Some(at);
    }

    pub fn has_been_seen(&self) -> bool {
        self.first_seen.is_some()
    }

    /// True when the endpoint is bound to the configuration this deployment wants.
    /// Without a desired configuration any binding counts.
    pub fn runs_desired_config(&self) -> bool {
        match &self.desired_config {
            None => true,
            Some(desired) => self.bound_config.as_deref() == Some(desired.as_str()),
        }
    }
}
