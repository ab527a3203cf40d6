// ABOUTME: Deployment orchestrator: validate, request, monitor, and roll back.
// ABOUTME: Drives the type-state deployment and condenses it into a DeployResult.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt::Display;

use crate::cloud::{
    ApprovalStatus, HostingApi, HostingError, LogOps, endpoint_console_url,
    log_group_console_url,
};
use crate::config::{MonitorConfig, RollbackConfig};
use crate::types::{
    EndpointConfigName, EndpointName, InstanceType, ModelPackageArn, RoleArn,
};

use super::Deployment;
use super::deployment::DeployPlan;
use super::error::DeployError;
use super::monitor::{DeploymentMonitor, MonitorFailure, MonitorResult, Shortfall};
use super::rollback::{Resource, RollbackController, RollbackError, RollbackReport, RollbackTarget};
use super::sink::ProgressSink;

/// Where the model package comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageSource {
    Arn(String),
    /// Newest approved package of a group, looked up at deploy time.
    Group(String),
}

/// A deployment as the operator asked for it, before validation.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub package: PackageSource,
    pub instance_type: String,
    pub endpoint_name: Option<String>,
    pub execution_role_arn: Option<String>,
    pub endpoint_prefix: String,
    pub update: bool,
    pub monitor: bool,
    pub rollback: bool,
}

#[derive(Debug, Clone)]
enum PackageRef {
    Resolved(ModelPackageArn),
    Group(String),
}

/// A request whose inputs all passed pre-flight checks.
#[derive(Debug, Clone)]
pub struct Preflight {
    package: PackageRef,
    instance_type: InstanceType,
    endpoint: EndpointName,
    execution_role: RoleArn,
    update: bool,
    pub warnings: Vec<String>,
}

impl Preflight {
    pub fn endpoint(&self) -> &EndpointName {
        &self.endpoint
    }
}

/// Check every input without touching the network. All problems are
/// reported together.
pub fn validate(request: &DeployRequest, now: DateTime<Utc>) -> Result<Preflight, Vec<String>> {
    let mut problems = Vec::new();
    let mut warnings = Vec::new();

    let package = match &request.package {
        PackageSource::Arn(arn) => match ModelPackageArn::parse(arn) {
            Ok(arn) => Some(PackageRef::Resolved(arn)),
            Err(e) => {
                problems.push(format!("model package ARN: {e}"));
                None
            }
        },
        PackageSource::Group(group) if group.trim().is_empty() => {
            problems.push("model package group cannot be empty".to_string());
            None
        }
        PackageSource::Group(group) => Some(PackageRef::Group(group.trim().to_string())),
    };

    let instance_type = match InstanceType::new(&request.instance_type) {
        Ok(t) => {
            if !t.is_recommended() {
                warnings.push(format!(
                    "instance type {t} is outside the recommended set ({})",
                    crate::types::RECOMMENDED_INSTANCE_TYPES.join(", ")
                ));
            }
            Some(t)
        }
        Err(e) => {
            problems.push(format!("instance type: {e}"));
            None
        }
    };

    let endpoint = match &request.endpoint_name {
        Some(name) => EndpointName::new(name),
        None => EndpointName::generate(&request.endpoint_prefix, now),
    };
    let endpoint = match endpoint {
        Ok(name) => Some(name),
        Err(e) => {
            problems.push(format!("endpoint name: {e}"));
            None
        }
    };

    let execution_role = match request.execution_role_arn.as_deref() {
        Some(arn) => match RoleArn::parse(arn) {
            Ok(role) => Some(role),
            Err(e) => {
                problems.push(format!("execution role ARN: {e}"));
                None
            }
        },
        None => {
            problems.push(format!(
                "execution role ARN missing; export {} or set execution_role_arn in {}",
                crate::config::ENV_EXECUTION_ROLE,
                crate::config::CONFIG_FILENAME
            ));
            None
        }
    };

    match (package, instance_type, endpoint, execution_role) {
        (Some(package), Some(instance_type), Some(endpoint), Some(execution_role))
            if problems.is_empty() =>
        {
            Ok(Preflight {
                package,
                instance_type,
                endpoint,
                execution_role,
                update: request.update,
                warnings,
            })
        }
        _ => Err(problems),
    }
}

/// What happened to resources after a failure.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RollbackDisposition {
    Completed { report: RollbackReport },
    Failed { error: RollbackError },
    /// Rollback was disabled; these commands remove what was left.
    Skipped { manual_steps: Vec<String> },
}

impl RollbackDisposition {
    pub fn manual_steps(&self) -> Vec<String> {
        match self {
            RollbackDisposition::Completed { .. } => Vec::new(),
            RollbackDisposition::Failed { error } => error.manual_steps(),
            RollbackDisposition::Skipped { manual_steps } => manual_steps.clone(),
        }
    }

    fn rolled_back(&self) -> bool {
        matches!(self, RollbackDisposition::Completed { .. })
    }
}

fn serialize_display<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Terminal result of one `deploy` run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum DeployResult {
    Validation {
        problems: Vec<String>,
    },
    CreationFailed {
        endpoint: EndpointName,
        #[serde(serialize_with = "serialize_display")]
        error: DeployError,
        /// Cleanup of partially created resources; `None` when nothing was created.
        cleanup: Option<RollbackDisposition>,
    },
    /// Requests accepted; the endpoint was not watched.
    Submitted {
        endpoint: EndpointName,
        config: EndpointConfigName,
        console_url: String,
    },
    Succeeded {
        endpoint: EndpointName,
        config: EndpointConfigName,
        console_url: String,
        retired: Vec<Resource>,
        monitor: MonitorResult,
    },
    Failed {
        endpoint: EndpointName,
        reason: String,
        console_url: String,
        log_console_url: String,
        monitor: MonitorResult,
        rollback: RollbackDisposition,
    },
    TimedOut {
        endpoint: EndpointName,
        console_url: String,
        log_console_url: String,
        monitor: MonitorResult,
        rollback: RollbackDisposition,
    },
}

impl DeployResult {
    /// The error this result amounts to, if any.
    pub fn error(&self) -> Option<DeployError> {
        match self {
            DeployResult::Validation { problems } => Some(DeployError::Validation(problems.clone())),
            DeployResult::CreationFailed { error, .. } => Some(error.clone()),
            DeployResult::Submitted { .. } | DeployResult::Succeeded { .. } => None,
            DeployResult::Failed {
                rollback: RollbackDisposition::Failed { error },
                ..
            }
            | DeployResult::TimedOut {
                rollback: RollbackDisposition::Failed { error },
                ..
            } => Some(DeployError::Rollback(error.clone())),
            DeployResult::Failed {
                endpoint,
                reason,
                rollback,
                ..
            } => Some(DeployError::TerminalDeploymentFailure {
                endpoint: endpoint.clone(),
                reason: reason.clone(),
                rolled_back: rollback.rolled_back(),
            }),
            DeployResult::TimedOut {
                endpoint, monitor, ..
            } => Some(DeployError::Timeout {
                endpoint: endpoint.clone(),
                after: monitor.elapsed,
            }),
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.error().map_or(0, |e| e.exit_code())
    }

    pub fn into_result(self) -> Result<DeployResult, DeployError> {
        match self.error() {
            Some(e) => Err(e),
            None => Ok(self),
        }
    }
}

pub struct Orchestrator<'a, H: HostingApi + ?Sized, L: LogOps + ?Sized> {
    hosting: &'a H,
    logs: &'a L,
    region: String,
    monitor: MonitorConfig,
    rollback: RollbackConfig,
}

impl<'a, H: HostingApi + ?Sized, L: LogOps + ?Sized> Orchestrator<'a, H, L> {
    pub fn new(
        hosting: &'a H,
        logs: &'a L,
        region: impl Into<String>,
        monitor: MonitorConfig,
        rollback: RollbackConfig,
    ) -> Self {
        Self {
            hosting,
            logs,
            region: region.into(),
            monitor,
            rollback,
        }
    }

    /// Validate, then run the deployment.
    pub async fn deploy(&self, request: &DeployRequest, sink: &dyn ProgressSink) -> DeployResult {
        let now = Utc::now();
        match validate(request, now) {
            Ok(preflight) => {
                self.run(preflight, request.monitor, request.rollback, now, sink)
                    .await
            }
            Err(problems) => DeployResult::Validation { problems },
        }
    }

    /// Run a validated deployment.
    pub async fn run(
        &self,
        preflight: Preflight,
        monitor: bool,
        rollback: bool,
        now: DateTime<Utc>,
        sink: &dyn ProgressSink,
    ) -> DeployResult {
        for warning in &preflight.warnings {
            sink.warning(warning);
        }

        let endpoint = preflight.endpoint.clone();
        let package = match preflight.package {
            PackageRef::Resolved(arn) => arn,
            PackageRef::Group(group) => match self.latest_approved_package(&group).await {
                Ok(arn) => {
                    sink.step(&format!("Resolved {group} to {arn}"));
                    arn
                }
                Err(problem) => {
                    return DeployResult::Validation {
                        problems: vec![problem],
                    };
                }
            },
        };

        let plan = DeployPlan {
            package,
            instance_type: preflight.instance_type,
            endpoint: endpoint.clone(),
            execution_role: preflight.execution_role,
            update: preflight.update,
        };

        sink.step(&format!("Deploying {} to {endpoint}", plan.package));
        let requested = match Deployment::new(plan).request(self.hosting, now).await {
            Ok(requested) => requested,
            Err(failure) => {
                let cleanup = if failure.created.is_empty() {
                    None
                } else {
                    Some(self.dispose(&failure.created, rollback, sink).await)
                };
                return DeployResult::CreationFailed {
                    endpoint,
                    error: failure.error,
                    cleanup,
                };
            }
        };

        let console_url = endpoint_console_url(&self.region, &endpoint);
        sink.step(&format!(
            "Requested {} with configuration {}",
            endpoint,
            requested.config()
        ));

        if !monitor {
            return DeployResult::Submitted {
                config: requested.config().clone(),
                endpoint,
                console_url,
            };
        }

        let watcher = DeploymentMonitor::new(self.hosting, self.logs, self.monitor.clone());
        match requested.monitor(&watcher, sink).await {
            Ok(live) => {
                let retired = live.retire_previous(self.hosting, sink).await;
                DeployResult::Succeeded {
                    config: live.config().clone(),
                    endpoint,
                    console_url,
                    retired,
                    monitor: live.finish(),
                }
            }
            Err((requested, failure)) => {
                let disposition = if rollback {
                    sink.step("Rolling back");
                    let controller = RollbackController::new(self.hosting, self.rollback.clone());
                    settle(requested.rollback(&controller).await, sink)
                } else {
                    RollbackDisposition::Skipped {
                        manual_steps: requested.rollback_target().manual_steps(),
                    }
                };
                let log_console_url = log_group_console_url(&self.region, &endpoint);
                let MonitorFailure { shortfall, result } = failure;
                match shortfall {
                    Shortfall::Failed { reason } => DeployResult::Failed {
                        reason,
                        endpoint,
                        console_url,
                        log_console_url,
                        monitor: result,
                        rollback: disposition,
                    },
                    Shortfall::TimedOut => DeployResult::TimedOut {
                        endpoint,
                        console_url,
                        log_console_url,
                        monitor: result,
                        rollback: disposition,
                    },
                }
            }
        }
    }

    /// Newest approved package in `group`.
    pub async fn latest_approved_package(&self, group: &str) -> Result<ModelPackageArn, String> {
        let packages = self
            .hosting
            .list_model_packages(group, Some(&ApprovalStatus::Approved))
            .await
            .map_err(|e| match e {
                HostingError::NotFound(_) => format!("model package group '{group}' not found"),
                other => format!("could not list packages of '{group}': {other}"),
            })?;

        let newest = packages
            .into_iter()
            .max_by_key(|p| (p.created_at, p.version))
            .ok_or_else(|| format!("model package group '{group}' has no approved packages"))?;

        ModelPackageArn::parse(&newest.arn)
            .map_err(|e| format!("registry returned an unusable ARN '{}': {e}", newest.arn))
    }

    async fn dispose(
        &self,
        target: &RollbackTarget,
        rollback: bool,
        sink: &dyn ProgressSink,
    ) -> RollbackDisposition {
        if !rollback {
            return RollbackDisposition::Skipped {
                manual_steps: target.manual_steps(),
            };
        }

        sink.step("Cleaning up partially created resources");
        let controller = RollbackController::new(self.hosting, self.rollback.clone());
        settle(controller.rollback(target).await, sink)
    }
}

fn settle(
    outcome: Result<RollbackReport, RollbackError>,
    sink: &dyn ProgressSink,
) -> RollbackDisposition {
    match outcome {
        Ok(report) => RollbackDisposition::Completed { report },
        Err(error) => {
            sink.warning(&error.to_string());
            RollbackDisposition::Failed { error }
        }
    }
}
