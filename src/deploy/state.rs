// ABOUTME: Deployment state types for the type state pattern.
// ABOUTME: Each state carries the resources that exist at that point.

use crate::types::{EndpointConfigName, ModelName};

use super::monitor::MonitorResult;
use super::strategy::DeployStrategy;

/// Inputs validated, nothing created yet.
/// Available actions: `request()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Validated;

/// Model, endpoint configuration, and endpoint create/update requested.
/// Available actions: `monitor()`, `rollback()`
#[derive(Debug, Clone)]
pub struct Requested {
    pub(crate) strategy: DeployStrategy,
    pub(crate) config: EndpointConfigName,
    pub(crate) model: ModelName,
}

/// Endpoint verified InService on the new configuration.
/// Available actions: `retire_previous()`, `finish()`
#[derive(Debug, Clone)]
pub struct Live {
    pub(crate) strategy: DeployStrategy,
    pub(crate) config: EndpointConfigName,
    pub(crate) model: ModelName,
    pub(crate) monitor: MonitorResult,
}
