// ABOUTME: State transition methods for deployment orchestration.
// ABOUTME: Each method consumes self and returns the next state on success.

use chrono::{DateTime, Utc};

use crate::cloud::{
    EndpointConfigSpec, EndpointOps, HostingError, LogOps, ModelSpec, ProvisioningOps,
};
use crate::types::{EndpointConfigName, EndpointName, ModelName};

use super::Deployment;
use super::error::DeployError;
use super::monitor::{DeploymentMonitor, MonitorFailure, MonitorResult, MonitorTarget};
use super::rollback::{
    Resource, Restore, RollbackController, RollbackError, RollbackReport, RollbackTarget,
};
use super::sink::ProgressSink;
use super::state::{Live, Requested, Validated};
use super::strategy::DeployStrategy;

/// Result type for transitions that hand the deployment back on failure.
pub type TransitionResult<T, S, E = DeployError> = Result<Deployment<T>, (Deployment<S>, E)>;

/// Suffix layout for resources created by an update.
const UPDATE_SUFFIX_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Requesting the deployment failed part way through.
///
/// `created` names only what this attempt created, never resources that
/// already existed under the same names.
#[derive(Debug)]
pub struct RequestFailure {
    pub error: DeployError,
    pub created: RollbackTarget,
}

impl RequestFailure {
    fn new(error: DeployError, created: RollbackTarget) -> Self {
        Self { error, created }
    }
}

// =============================================================================
// Validated -> Requested
// =============================================================================

impl Deployment<Validated> {
    /// Create the model and endpoint configuration, then create the endpoint
    /// or re-point it at the new configuration.
    ///
    /// # Errors
    ///
    /// `EndpointExists` / `EndpointBusy` before anything is created; otherwise
    /// `CreationFailed` along with whatever was created before the failing call.
    pub async fn request<H>(
        self,
        hosting: &H,
        now: DateTime<Utc>,
    ) -> Result<Deployment<Requested>, RequestFailure>
    where
        H: EndpointOps + ProvisioningOps + ?Sized,
    {
        let endpoint = self.plan.endpoint.clone();
        let mut created = RollbackTarget::default();

        let existing = match hosting.describe_endpoint(&endpoint).await {
            Ok(description) => Some(description),
            Err(HostingError::NotFound(_)) => None,
            Err(HostingError::Transient(message)) => {
                return Err(RequestFailure::new(DeployError::Transient(message), created));
            }
            Err(e) => {
                return Err(RequestFailure::new(
                    DeployError::creation(format!("endpoint lookup for {endpoint}"), e),
                    created,
                ));
            }
        };

        let strategy = DeployStrategy::for_endpoint(&endpoint, existing.as_ref(), self.plan.update)
            .map_err(|e| RequestFailure::new(e, RollbackTarget::default()))?;

        let (config, model) = resource_names(&endpoint, &strategy, now);
        tracing::info!(
            endpoint = %endpoint,
            config = %config,
            model = %model,
            update = strategy.is_update(),
            "requesting deployment"
        );

        let model_spec = ModelSpec {
            name: model.clone(),
            package: self.plan.package.clone(),
            execution_role: self.plan.execution_role.clone(),
        };
        if let Err(e) = hosting.create_model(&model_spec).await {
            return Err(RequestFailure::new(
                DeployError::creation(format!("model {model}"), e),
                created,
            ));
        }
        created.model = Some(model.clone());

        let config_spec = EndpointConfigSpec::single_instance(
            config.clone(),
            model.clone(),
            self.plan.instance_type.clone(),
        );
        if let Err(e) = hosting.create_endpoint_config(&config_spec).await {
            return Err(RequestFailure::new(
                DeployError::creation(format!("endpoint configuration {config}"), e),
                created,
            ));
        }
        created.config = Some(config.clone());

        let submitted = match &strategy {
            DeployStrategy::Create => hosting.create_endpoint(&endpoint, &config).await,
            DeployStrategy::Update { .. } => hosting.update_endpoint(&endpoint, &config).await,
        };
        if let Err(e) = submitted {
            let error = match e {
                HostingError::AlreadyExists(_) => DeployError::EndpointExists(endpoint.clone()),
                other => DeployError::creation(format!("endpoint {endpoint}"), other),
            };
            return Err(RequestFailure::new(error, created));
        }

        Ok(Deployment {
            plan: self.plan,
            state: Requested {
                strategy,
                config,
                model,
            },
        })
    }
}

/// For an update, the endpoint and the configuration to move it back to.
fn restore_for(endpoint: &EndpointName, strategy: &DeployStrategy) -> Option<Restore> {
    let DeployStrategy::Update { previous_config } = strategy else {
        return None;
    };
    Some(Restore {
        endpoint: endpoint.clone(),
        previous: previous_config
            .as_deref()
            .and_then(|name| EndpointConfigName::new(name).ok()),
    })
}

fn resource_names(
    endpoint: &EndpointName,
    strategy: &DeployStrategy,
    now: DateTime<Utc>,
) -> (EndpointConfigName, ModelName) {
    match strategy {
        DeployStrategy::Create => (
            EndpointConfigName::for_endpoint(endpoint),
            ModelName::for_endpoint(endpoint),
        ),
        DeployStrategy::Update { .. } => {
            let suffix = now.format(UPDATE_SUFFIX_FORMAT).to_string();
            (
                EndpointConfigName::derived(endpoint, &suffix),
                ModelName::derived(endpoint, &suffix),
            )
        }
    }
}

// =============================================================================
// Requested -> Live
// =============================================================================

impl Deployment<Requested> {
    /// Watch the endpoint until it runs the new configuration.
    ///
    /// On failure or timeout the deployment comes back in `Requested` so the
    /// caller can roll it back.
    pub async fn monitor<E, L>(
        self,
        monitor: &DeploymentMonitor<'_, E, L>,
        sink: &dyn ProgressSink,
    ) -> TransitionResult<Live, Requested, MonitorFailure>
    where
        E: EndpointOps + ?Sized,
        L: LogOps + ?Sized,
    {
        let target = MonitorTarget {
            endpoint: self.plan.endpoint.clone(),
            expected_config: Some(self.state.config.clone()),
        };
        let result = match MonitorFailure::check(monitor.monitor(&target, sink).await) {
            Ok(result) => result,
            Err(failure) => return Err((self, failure)),
        };

        let Requested {
            strategy,
            config,
            model,
        } = self.state;
        Ok(Deployment {
            plan: self.plan,
            state: Live {
                strategy,
                config,
                model,
                monitor: result,
            },
        })
    }

    /// What rollback removes: everything for a new endpoint, only the new
    /// configuration and model for an update, after the endpoint is back on
    /// its previous configuration.
    pub fn rollback_target(&self) -> RollbackTarget {
        RollbackTarget {
            endpoint: match self.state.strategy {
                DeployStrategy::Create => Some(self.plan.endpoint.clone()),
                DeployStrategy::Update { .. } => None,
            },
            config: Some(self.state.config.clone()),
            model: Some(self.state.model.clone()),
            restore: restore_for(&self.plan.endpoint, &self.state.strategy),
        }
    }

    /// Undo this deployment.
    pub async fn rollback<H>(
        self,
        controller: &RollbackController<'_, H>,
    ) -> Result<RollbackReport, RollbackError>
    where
        H: EndpointOps + ProvisioningOps + ?Sized,
    {
        controller.rollback(&self.rollback_target()).await
    }
}

// =============================================================================
// Live
// =============================================================================

impl Deployment<Live> {
    /// After an update, delete the configuration the endpoint ran before and
    /// the model behind it. Best effort: problems are reported, not returned.
    pub async fn retire_previous<H>(&self, hosting: &H, sink: &dyn ProgressSink) -> Vec<Resource>
    where
        H: EndpointOps + ProvisioningOps + ?Sized,
    {
        let DeployStrategy::Update {
            previous_config: Some(previous),
        } = &self.state.strategy
        else {
            return Vec::new();
        };
        let Ok(previous) = EndpointConfigName::new(previous.as_str()) else {
            return Vec::new();
        };
        if previous == self.state.config {
            return Vec::new();
        }

        let mut retired = Vec::new();
        let previous_model = match hosting.describe_endpoint_config(&previous).await {
            Ok(details) => details
                .variants
                .iter()
                .find_map(|v| v.model_name.as_deref())
                .and_then(|name| ModelName::new(name).ok()),
            Err(e) => {
                warn(sink, format!("could not inspect previous configuration {previous}: {e}"));
                None
            }
        };

        match hosting.delete_endpoint_config(&previous).await {
            Ok(()) | Err(HostingError::NotFound(_)) => {
                retired.push(Resource::EndpointConfig(previous.clone()));
            }
            Err(e) => warn(sink, format!("could not delete previous configuration {previous}: {e}")),
        }

        if let Some(model) = previous_model.filter(|m| *m != self.state.model) {
            match hosting.delete_model(&model).await {
                Ok(()) | Err(HostingError::NotFound(_)) => retired.push(Resource::Model(model)),
                Err(e) => warn(sink, format!("could not delete previous model {model}: {e}")),
            }
        }

        retired
    }

    pub fn finish(self) -> MonitorResult {
        self.state.monitor
    }
}

fn warn(sink: &dyn ProgressSink, message: String) {
    tracing::warn!("{message}");
    sink.warning(&message);
}
