// ABOUTME: Deployment orchestration using the type state pattern.
// ABOUTME: Exports the monitor, log tailer, rollback controller, and Deployment struct.

mod deployment;
mod endpoint_state;
mod error;
mod monitor;
mod orchestrator;
mod prober;
mod rollback;
mod sink;
mod state;
mod strategy;
mod tailer;
mod transitions;

pub use deployment::{DeployPlan, Deployment};
pub use endpoint_state::EndpointState;
pub use error::DeployError;
pub use monitor::{
    DeploymentMonitor, MonitorFailure, MonitorOutcome, MonitorResult, MonitorTarget, Shortfall,
};
pub use orchestrator::{
    DeployRequest, DeployResult, Orchestrator, PackageSource, Preflight, RollbackDisposition,
    validate,
};
pub use prober::{ProbeError, StatusProber};
pub use rollback::{
    Disposal, Leftover, Resource, ResourceOutcome, Restore, RollbackController, RollbackError,
    RollbackReport, RollbackTarget,
};
pub use sink::{NullSink, ProgressSink};
pub use state::{Live, Requested, Validated};
pub use strategy::DeployStrategy;
pub use tailer::{
    Discovery, FetchCadence, LogCursor, LogRecord, LogTailer, StreamHandle, TailSettings,
};
pub use transitions::{RequestFailure, TransitionResult};
