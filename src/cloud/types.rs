// ABOUTME: Backend-neutral descriptions of SageMaker and CloudWatch resources.
// ABOUTME: Converted from SDK output so deploy logic never touches SDK types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::types::{EndpointConfigName, InstanceType, ModelName, ModelPackageArn, RoleArn};

/// Name of the single production variant every endpoint configuration carries.
pub const VARIANT_NAME: &str = "AllTraffic";

/// Lifecycle status of a hosted endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum EndpointStatus {
    Creating,
    Updating,
    SystemUpdating,
    RollingBack,
    InService,
    OutOfService,
    Deleting,
    Failed,
    UpdateRollbackFailed,
    Unknown(String),
}

impl EndpointStatus {
    pub fn parse(value: &str) -> Self {
        match value {
            "Creating" => Self::Creating,
            "Updating" => Self::Updating,
            "SystemUpdating" => Self::SystemUpdating,
            "RollingBack" => Self::RollingBack,
            "InService" => Self::InService,
            "OutOfService" => Self::OutOfService,
            "Deleting" => Self::Deleting,
            "Failed" => Self::Failed,
            "UpdateRollbackFailed" => Self::UpdateRollbackFailed,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Creating => "Creating",
            Self::Updating => "Updating",
            Self::SystemUpdating => "SystemUpdating",
            Self::RollingBack => "RollingBack",
            Self::InService => "InService",
            Self::OutOfService => "OutOfService",
            Self::Deleting => "Deleting",
            Self::Failed => "Failed",
            Self::UpdateRollbackFailed => "UpdateRollbackFailed",
            Self::Unknown(s) => s,
        }
    }

    /// Statuses that mean provisioning is still under way.
    pub fn is_transitional(&self) -> bool {
        matches!(
            self,
            Self::Creating
                | Self::Updating
                | Self::SystemUpdating
                | Self::RollingBack
                | Self::Unknown(_)
        )
    }
}

impl fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime view of one production variant on a live endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantSummary {
    pub name: String,
    pub current_instance_count: Option<i32>,
    pub desired_instance_count: Option<i32>,
}

/// Result of describing an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointDescription {
    pub name: String,
    pub status: EndpointStatus,
    pub config_name: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub last_modified_at: Option<DateTime<Utc>>,
    pub variants: Vec<VariantSummary>,
}

/// Everything needed to register a model backed by a model package.
#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub name: ModelName,
    pub package: ModelPackageArn,
    pub execution_role: RoleArn,
}

/// A single-variant endpoint configuration.
#[derive(Debug, Clone)]
pub struct EndpointConfigSpec {
    pub name: EndpointConfigName,
    pub model: ModelName,
    pub instance_type: InstanceType,
    pub initial_instance_count: i32,
}

impl EndpointConfigSpec {
    pub fn single_instance(
        name: EndpointConfigName,
        model: ModelName,
        instance_type: InstanceType,
    ) -> Self {
        Self {
            name,
            model,
            instance_type,
            initial_instance_count: 1,
        }
    }
}

/// Static view of one production variant in an endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigVariant {
    pub name: String,
    pub model_name: Option<String>,
    pub instance_type: Option<String>,
    pub initial_instance_count: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointConfigDescription {
    pub name: String,
    pub variants: Vec<ConfigVariant>,
}

/// Approval state of a registered model package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ApprovalStatus {
    Approved,
    PendingManualApproval,
    Rejected,
    Unknown(String),
}

impl ApprovalStatus {
    pub fn parse(value: &str) -> Self {
        match value {
            "Approved" => Self::Approved,
            "PendingManualApproval" => Self::PendingManualApproval,
            "Rejected" => Self::Rejected,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Approved => "Approved",
            Self::PendingManualApproval => "PendingManualApproval",
            Self::Rejected => "Rejected",
            Self::Unknown(s) => s,
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelPackageSummary {
    pub arn: String,
    pub group: Option<String>,
    pub version: Option<i32>,
    pub approval: ApprovalStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

/// One page request against a log group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub group: String,
    /// Inclusive lower bound, epoch milliseconds.
    pub start_time_ms: i64,
    pub next_token: Option<String>,
    pub limit: i32,
}

/// A raw event as returned by the log backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub stream: String,
    pub timestamp_ms: i64,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogPage {
    pub events: Vec<LogEvent>,
    pub next_token: Option<String>,
}
