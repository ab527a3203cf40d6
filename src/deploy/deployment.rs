// ABOUTME: Generic deployment struct parameterized by state marker.
// ABOUTME: State types carry the resources created so far for compile-time guarantees.

use crate::types::{EndpointConfigName, EndpointName, InstanceType, ModelName, ModelPackageArn, RoleArn};

use super::monitor::MonitorResult;
use super::state::{Live, Requested, Validated};
use super::strategy::DeployStrategy;

/// Inputs for one deployment, all validated.
#[derive(Debug, Clone)]
pub struct DeployPlan {
    pub package: ModelPackageArn,
    pub instance_type: InstanceType,
    pub endpoint: EndpointName,
    pub execution_role: RoleArn,
    /// Roll onto an existing endpoint instead of refusing.
    pub update: bool,
}

/// A deployment in progress, parameterized by its current state.
///
/// The state type parameter `S` carries the names of the resources created
/// so far, so rollback can only be asked of a deployment that created some.
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) plan: DeployPlan,
    pub(crate) state: S,
}

impl Deployment<Validated> {
    pub fn new(plan: DeployPlan) -> Self {
        Deployment {
            plan,
            state: Validated,
        }
    }
}

impl<S> Deployment<S> {
    pub fn plan(&self) -> &DeployPlan {
        &self.plan
    }

    pub fn endpoint(&self) -> &EndpointName {
        &self.plan.endpoint
    }
}

impl Deployment<Requested> {
    pub fn strategy(&self) -> &DeployStrategy {
        &self.state.strategy
    }

    /// The configuration this deployment put on the endpoint.
    pub fn config(&self) -> &EndpointConfigName {
        &self.state.config
    }

    pub fn model(&self) -> &ModelName {
        &self.state.model
    }
}

impl Deployment<Live> {
    pub fn strategy(&self) -> &DeployStrategy {
        &self.state.strategy
    }

    pub fn config(&self) -> &EndpointConfigName {
        &self.state.config
    }

    pub fn model(&self) -> &ModelName {
        &self.state.model
    }

    pub fn monitor_result(&self) -> &MonitorResult {
        &self.state.monitor
    }
}
