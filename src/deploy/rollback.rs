// ABOUTME: Rollback controller deleting the resources of a failed deployment.
// ABOUTME: Endpoint first (verified), then its configuration, then its model; idempotent.

use nonempty::NonEmpty;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use tokio::time::Instant;

use crate::cloud::{EndpointDescription, EndpointOps, EndpointStatus, HostingError, ProvisioningOps};
use crate::config::RollbackConfig;
use crate::output::format_duration;
use crate::types::{EndpointConfigName, EndpointName, ModelName};

/// A resource the controller may delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Resource {
    Endpoint(EndpointName),
    EndpointConfig(EndpointConfigName),
    Model(ModelName),
    /// An updated endpoint still bound to the configuration being removed.
    EndpointBinding {
        endpoint: EndpointName,
        previous: Option<EndpointConfigName>,
    },
}

impl Resource {
    /// The CLI command that removes this resource by hand.
    pub fn manual_command(&self) -> String {
        match self {
            Resource::Endpoint(name) => {
                format!("aws sagemaker delete-endpoint --endpoint-name {name}")
            }
            Resource::EndpointConfig(name) => {
                format!("aws sagemaker delete-endpoint-config --endpoint-config-name {name}")
            }
            Resource::Model(name) => format!("aws sagemaker delete-model --model-name {name}"),
            Resource::EndpointBinding {
                endpoint,
                previous: Some(previous),
            } => format!(
                "aws sagemaker update-endpoint --endpoint-name {endpoint} --endpoint-config-name {previous}"
            ),
            Resource::EndpointBinding {
                endpoint,
                previous: None,
            } => format!("aws sagemaker describe-endpoint --endpoint-name {endpoint}"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Endpoint(name) => write!(f, "endpoint {name}"),
            Resource::EndpointConfig(name) => write!(f, "endpoint configuration {name}"),
            Resource::Model(name) => write!(f, "model {name}"),
            Resource::EndpointBinding { endpoint, .. } => {
                write!(f, "configuration binding of endpoint {endpoint}")
            }
        }
    }
}

/// An updated endpoint to move back off the configuration being removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Restore {
    pub endpoint: EndpointName,
    /// What the endpoint ran before the update, if it was known.
    pub previous: Option<EndpointConfigName>,
}

/// What to delete. Missing entries are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RollbackTarget {
    pub endpoint: Option<EndpointName>,
    pub config: Option<EndpointConfigName>,
    pub model: Option<ModelName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restore: Option<Restore>,
}

impl RollbackTarget {
    pub fn is_empty(&self) -> bool {
        self.endpoint.is_none() && self.config.is_none() && self.model.is_none()
    }

    /// Resources in deletion order.
    pub fn resources(&self) -> Vec<Resource> {
        let mut resources = Vec::new();
        if let Some(endpoint) = &self.endpoint {
            resources.push(Resource::Endpoint(endpoint.clone()));
        }
        if let Some(config) = &self.config {
            resources.push(Resource::EndpointConfig(config.clone()));
        }
        if let Some(model) = &self.model {
            resources.push(Resource::Model(model.clone()));
        }
        resources
    }

    /// Commands that undo the deployment by hand. For an update the endpoint
    /// is pointed back at its previous configuration first.
    pub fn manual_steps(&self) -> Vec<String> {
        let rebind = self.restore.as_ref().map(|restore| Resource::EndpointBinding {
            endpoint: restore.endpoint.clone(),
            previous: restore.previous.clone(),
        });
        rebind
            .iter()
            .chain(self.resources().iter())
            .map(Resource::manual_command)
            .collect()
    }

    /// Build a target from what an endpoint currently runs: the endpoint,
    /// its bound configuration, and the model behind that configuration.
    pub async fn discover<H>(hosting: &H, endpoint: &EndpointName) -> Result<Self, HostingError>
    where
        H: EndpointOps + ProvisioningOps + ?Sized,
    {
        let mut target = RollbackTarget {
            endpoint: Some(endpoint.clone()),
            ..Default::default()
        };

        let description = match hosting.describe_endpoint(endpoint).await {
            Ok(description) => description,
            Err(HostingError::NotFound(_)) => return Ok(target),
            Err(e) => return Err(e),
        };

        let Some(config) = description
            .config_name
            .and_then(|name| EndpointConfigName::new(name).ok())
        else {
            return Ok(target);
        };

        match hosting.describe_endpoint_config(&config).await {
            Ok(details) => {
                target.model = details
                    .variants
                    .iter()
                    .find_map(|v| v.model_name.as_deref())
                    .and_then(|name| ModelName::new(name).ok());
            }
            Err(HostingError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
        target.config = Some(config);
        Ok(target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposal {
    Deleted,
    AlreadyAbsent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceOutcome {
    pub resource: Resource,
    pub disposal: Disposal,
}

/// Everything the controller removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RollbackReport {
    pub removed: Vec<ResourceOutcome>,
    /// Configuration an updated endpoint was moved back to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restored: Option<EndpointConfigName>,
}

impl RollbackReport {
    pub fn deleted(&self) -> impl Iterator<Item = &Resource> {
        self.removed
            .iter()
            .filter(|o| o.disposal == Disposal::Deleted)
            .map(|o| &o.resource)
    }
}

/// A resource that is still there after rollback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Leftover {
    pub resource: Resource,
    pub reason: String,
}

/// Rollback left at least one resource behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("rollback incomplete; {} resource(s) left behind: {}", .leftovers.len(), describe(.leftovers))]
pub struct RollbackError {
    pub leftovers: NonEmpty<Leftover>,
    pub partial: RollbackReport,
}

fn describe(leftovers: &NonEmpty<Leftover>) -> String {
    leftovers
        .iter()
        .map(|l| format!("{} ({})", l.resource, l.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

impl RollbackError {
    /// Commands that finish the cleanup by hand.
    pub fn manual_steps(&self) -> Vec<String> {
        self.leftovers
            .iter()
            .map(|l| l.resource.manual_command())
            .collect()
    }
}

pub struct RollbackController<'a, H: EndpointOps + ProvisioningOps + ?Sized> {
    hosting: &'a H,
    config: RollbackConfig,
}

impl<'a, H: EndpointOps + ProvisioningOps + ?Sized> RollbackController<'a, H> {
    pub fn new(hosting: &'a H, config: RollbackConfig) -> Self {
        Self { hosting, config }
    }

    /// Delete the target's resources: endpoint, then configuration, then model.
    ///
    /// Not-found counts as already deleted, so running this twice is safe.
    /// If the endpoint can't be confirmed gone, its configuration and model
    /// are left in place so it stays inspectable. An updated endpoint still
    /// running the configuration is first moved back to its previous one; if
    /// that fails the configuration and model are left in place too.
    pub async fn rollback(&self, target: &RollbackTarget) -> Result<RollbackReport, RollbackError> {
        let mut report = RollbackReport::default();
        let mut leftovers: Vec<Leftover> = Vec::new();
        let mut blocked: Option<&str> = None;

        if let Some(endpoint) = &target.endpoint {
            let resource = Resource::Endpoint(endpoint.clone());
            match self.delete_endpoint(endpoint).await {
                Ok(disposal) => report.removed.push(ResourceOutcome { resource, disposal }),
                Err(reason) => {
                    leftovers.push(Leftover { resource, reason });
                    blocked = Some("skipped while the endpoint still exists");
                }
            }
        }

        if let (Some(restore), Some(config)) = (&target.restore, &target.config) {
            match self.restore(restore, config).await {
                Ok(restored) => report.restored = restored,
                Err(reason) => {
                    leftovers.push(Leftover {
                        resource: Resource::EndpointBinding {
                            endpoint: restore.endpoint.clone(),
                            previous: restore.previous.clone(),
                        },
                        reason,
                    });
                    blocked = Some("skipped while the endpoint still uses it");
                }
            }
        }

        if let Some(config) = &target.config {
            let resource = Resource::EndpointConfig(config.clone());
            if let Some(reason) = blocked {
                leftovers.push(Leftover {
                    resource,
                    reason: reason.to_string(),
                });
            } else {
                match self
                    .delete_with_retry(|| self.hosting.delete_endpoint_config(config))
                    .await
                {
                    Ok(disposal) => report.removed.push(ResourceOutcome { resource, disposal }),
                    Err(e) => leftovers.push(Leftover {
                        resource,
                        reason: e.to_string(),
                    }),
                }
            }
        }

        if let Some(model) = &target.model {
            let resource = Resource::Model(model.clone());
            if let Some(reason) = blocked {
                leftovers.push(Leftover {
                    resource,
                    reason: reason.to_string(),
                });
            } else {
                match self
                    .delete_with_retry(|| self.hosting.delete_model(model))
                    .await
                {
                    Ok(disposal) => report.removed.push(ResourceOutcome { resource, disposal }),
                    Err(e) => leftovers.push(Leftover {
                        resource,
                        reason: e.to_string(),
                    }),
                }
            }
        }

        match NonEmpty::from_vec(leftovers) {
            None => {
                tracing::info!(removed = report.removed.len(), "rollback complete");
                Ok(report)
            }
            Some(leftovers) => Err(RollbackError {
                leftovers,
                partial: report,
            }),
        }
    }

    /// Make sure an updated endpoint no longer runs `abandoned`.
    ///
    /// Waits for the endpoint to settle; if it still runs `abandoned`, points
    /// it back at the previous configuration and waits for that to be
    /// InService. Returns the configuration it was moved back to.
    async fn restore(
        &self,
        restore: &Restore,
        abandoned: &EndpointConfigName,
    ) -> Result<Option<EndpointConfigName>, String> {
        let endpoint = &restore.endpoint;
        let Some(settled) = self.settle(endpoint).await? else {
            return Ok(None);
        };
        if settled.config_name.as_deref() != Some(abandoned.as_str()) {
            return Ok(None);
        }

        let Some(previous) = &restore.previous else {
            return Err(format!(
                "endpoint still runs {abandoned} and its previous configuration is unknown"
            ));
        };
        tracing::info!(endpoint = %endpoint, config = %previous, "restoring previous configuration");
        self.hosting
            .update_endpoint(endpoint, previous)
            .await
            .map_err(|e| format!("could not switch back to {previous}: {e}"))?;

        match self.settle(endpoint).await? {
            Some(d)
                if d.status == EndpointStatus::InService
                    && d.config_name.as_deref() == Some(previous.as_str()) =>
            {
                Ok(Some(previous.clone()))
            }
            Some(d) => Err(format!(
                "switching back to {previous} ended {} on {}",
                d.status,
                d.config_name.as_deref().unwrap_or("no configuration")
            )),
            None => Err(format!("endpoint disappeared while switching back to {previous}")),
        }
    }

    /// Poll until the endpoint leaves its transitional states, up to the
    /// settle timeout. `None` once it no longer exists.
    async fn settle(&self, endpoint: &EndpointName) -> Result<Option<EndpointDescription>, String> {
        let deadline = Instant::now() + self.config.settle_timeout;
        let mut last_seen = String::from("unknown");
        loop {
            match self.hosting.describe_endpoint(endpoint).await {
                Err(HostingError::NotFound(_)) => return Ok(None),
                Ok(d) if !d.status.is_transitional() => return Ok(Some(d)),
                Ok(d) => last_seen = d.status.to_string(),
                Err(e) if e.is_transient() => last_seen = e.to_string(),
                Err(e) => return Err(e.to_string()),
            }
            if Instant::now() + self.config.verify_interval > deadline {
                return Err(format!(
                    "endpoint still {last_seen} after {}",
                    format_duration(self.config.settle_timeout.as_secs_f64())
                ));
            }
            tracing::debug!(endpoint = %endpoint, status = %last_seen, "waiting for endpoint to settle");
            tokio::time::sleep(self.config.verify_interval).await;
        }
    }

    async fn delete_endpoint(&self, endpoint: &EndpointName) -> Result<Disposal, String> {
        let disposal = self
            .delete_with_retry(|| self.hosting.delete_endpoint(endpoint))
            .await
            .map_err(|e| e.to_string())?;

        if disposal == Disposal::AlreadyAbsent {
            return Ok(disposal);
        }

        let mut last_seen = String::from("unknown");
        for attempt in 1..=self.config.verify_attempts {
            match self.hosting.describe_endpoint(endpoint).await {
                Err(HostingError::NotFound(_)) => return Ok(disposal),
                Ok(d) if d.status == EndpointStatus::Deleting => return Ok(disposal),
                Ok(d) => last_seen = d.status.to_string(),
                Err(e) => last_seen = e.to_string(),
            }
            tracing::debug!(endpoint = %endpoint, attempt, status = %last_seen, "deletion not confirmed yet");
            if attempt < self.config.verify_attempts {
                tokio::time::sleep(self.config.verify_interval).await;
            }
        }

        Err(format!(
            "deletion not confirmed after {} checks (last seen: {last_seen})",
            self.config.verify_attempts
        ))
    }

    /// Run a delete call, retrying transient failures a bounded number of times.
    async fn delete_with_retry<F, Fut>(&self, mut call: F) -> Result<Disposal, HostingError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), HostingError>>,
    {
        let attempts = self.config.verify_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(()) => return Ok(Disposal::Deleted),
                Err(HostingError::NotFound(_)) => return Ok(Disposal::AlreadyAbsent),
                Err(e) if e.is_transient() && attempt < attempts => {
                    tracing::warn!(attempt, error = %e, "delete failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(self.config.verify_interval).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
