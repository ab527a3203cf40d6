// ABOUTME: Monitor command: attach to an existing endpoint and wait for it to settle.
// ABOUTME: Recovers a deployment whose original run was interrupted.

use super::deploy::{failure_guidance, rollback_summary};
use super::{connect, load_settings};
use sagedeploy::cloud::{HostingSnafu, endpoint_console_url, log_group_console_url};
use sagedeploy::config::Overrides;
use sagedeploy::deploy::{
    DeployError, DeploymentMonitor, MonitorOutcome, MonitorTarget, RollbackController,
    RollbackDisposition, RollbackTarget,
};
use sagedeploy::error::Result;
use sagedeploy::output::Output;
use sagedeploy::types::EndpointName;
use snafu::ResultExt;

pub async fn monitor(
    endpoint: &str,
    rollback: bool,
    overrides: Overrides,
    mut output: Output,
) -> Result<()> {
    output.start_timer();
    let endpoint =
        EndpointName::new(endpoint).map_err(|e| DeployError::Validation(vec![e.to_string()]))?;
    let settings = load_settings(&overrides)?;
    let session = connect(&settings).await?;
    let hosting = session.hosting();
    let logs = session.logs();
    let region = session.region();

    output.progress(&format!("Monitoring {endpoint}"));
    let watcher = DeploymentMonitor::new(&hosting, &logs, settings.monitor.clone());
    let result = watcher
        .monitor(&MonitorTarget::endpoint(endpoint.clone()), &output)
        .await;
    output.report(&result);

    if result.succeeded() {
        output.success(&format!("Endpoint {endpoint} is InService"));
        return Ok(());
    }

    failure_guidance(
        &output,
        &endpoint,
        &endpoint_console_url(region, &endpoint),
        &log_group_console_url(region, &endpoint),
    );

    let disposition = if rollback {
        output.progress("Rolling back");
        let target = RollbackTarget::discover(&hosting, &endpoint)
            .await
            .context(HostingSnafu)?;
        let controller = RollbackController::new(&hosting, settings.rollback.clone());
        match controller.rollback(&target).await {
            Ok(report) => RollbackDisposition::Completed { report },
            Err(error) => RollbackDisposition::Failed { error },
        }
    } else {
        RollbackDisposition::Skipped {
            manual_steps: RollbackTarget::discover(&hosting, &endpoint)
                .await
                .map(|t| t.manual_steps())
                .unwrap_or_default(),
        }
    };
    rollback_summary(&output, &disposition);

    let error = match (disposition, result.outcome) {
        (RollbackDisposition::Failed { error }, _) => DeployError::Rollback(error),
        (disposition, MonitorOutcome::Failed { reason }) => {
            DeployError::TerminalDeploymentFailure {
                endpoint,
                reason,
                rolled_back: matches!(disposition, RollbackDisposition::Completed { .. }),
            }
        }
        (_, MonitorOutcome::TimedOut | MonitorOutcome::Succeeded) => DeployError::Timeout {
            endpoint,
            after: result.elapsed,
        },
    };
    Err(error.into())
}
