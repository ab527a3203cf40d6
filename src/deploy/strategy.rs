// ABOUTME: Deployment strategy selection from the endpoint's current state.
// ABOUTME: Chooses create for new endpoints and update for existing ones when allowed.

use crate::cloud::{EndpointDescription, EndpointStatus};
use crate::types::EndpointName;

use super::error::DeployError;

/// How the new model reaches the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployStrategy {
    /// New endpoint; model and configuration share its name.
    Create,

    /// Existing endpoint re-pointed at a fresh configuration. The previous
    /// configuration stays until the new one is verified live.
    Update { previous_config: Option<String> },
}

impl DeployStrategy {
    /// Pick a strategy given what describing the endpoint returned.
    pub fn for_endpoint(
        endpoint: &EndpointName,
        existing: Option<&EndpointDescription>,
        update_requested: bool,
    ) -> Result<Self, DeployError> {
        let Some(existing) = existing else {
            return Ok(DeployStrategy::Create);
        };

        if !update_requested {
            return Err(DeployError::EndpointExists(endpoint.clone()));
        }

        if existing.status != EndpointStatus::InService {
            return Err(DeployError::EndpointBusy {
                endpoint: endpoint.clone(),
                status: existing.status.to_string(),
            });
        }

        Ok(DeployStrategy::Update {
            previous_config: existing.config_name.clone(),
        })
    }

    pub fn is_update(&self) -> bool {
        matches!(self, DeployStrategy::Update { .. })
    }
}
