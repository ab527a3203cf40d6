// ABOUTME: Deploy command implementation.
// ABOUTME: Runs pre-flight validation, the orchestrator, and prints next steps on failure.

use super::{connect, load_settings};
use chrono::Utc;
use sagedeploy::config::Overrides;
use sagedeploy::deploy::{
    DeployError, DeployRequest, DeployResult, Orchestrator, PackageSource, RollbackDisposition,
    validate,
};
use sagedeploy::error::Result;
use sagedeploy::output::Output;
use sagedeploy::types::EndpointName;

/// Flags of the `deploy` subcommand.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    pub package: PackageSource,
    pub instance_type: String,
    pub endpoint_name: Option<String>,
    pub monitor: bool,
    pub rollback: bool,
    pub update: bool,
}

pub async fn deploy(options: DeployOptions, overrides: Overrides, mut output: Output) -> Result<()> {
    output.start_timer();
    let settings = load_settings(&overrides)?;

    let request = DeployRequest {
        package: options.package,
        instance_type: options.instance_type,
        endpoint_name: options.endpoint_name,
        execution_role_arn: settings.execution_role_arn.clone(),
        endpoint_prefix: settings.endpoint_prefix.clone(),
        update: options.update,
        monitor: options.monitor,
        rollback: options.rollback,
    };

    // Nothing touches AWS until every input checks out.
    let now = Utc::now();
    let preflight = match validate(&request, now) {
        Ok(preflight) => preflight,
        Err(problems) => {
            output.section("Invalid deployment request:", &problems);
            return Err(DeployError::Validation(problems).into());
        }
    };

    let session = connect(&settings).await?;
    let hosting = session.hosting();
    let logs = session.logs();
    let orchestrator = Orchestrator::new(
        &hosting,
        &logs,
        session.region(),
        settings.monitor,
        settings.rollback,
    );

    let result = orchestrator
        .run(preflight, request.monitor, request.rollback, now, &output)
        .await;

    explain(&output, &result, session.region());
    output.report(&result);
    result.into_result()?;
    Ok(())
}

/// Print the outcome and, for failures, where to look and what to clean up.
pub(super) fn explain(output: &Output, result: &DeployResult, region: &str) {
    match result {
        DeployResult::Validation { problems } => {
            output.section("Invalid deployment request:", problems);
        }
        DeployResult::CreationFailed {
            endpoint, cleanup, ..
        } => {
            let steps = cleanup
                .as_ref()
                .map(RollbackDisposition::manual_steps)
                .unwrap_or_default();
            if !steps.is_empty() {
                output.section("Remove the partially created resources with:", &steps);
            }
            output.section(
                "Inspect the endpoint with:",
                &[describe_command(endpoint)],
            );
        }
        DeployResult::Submitted {
            endpoint,
            config,
            console_url,
        } => {
            output.success(&format!(
                "Submitted {endpoint} with configuration {config} (not monitored)"
            ));
            output.section(
                "Follow it with:",
                &[
                    format!("sagedeploy status -e {endpoint} --region {region}"),
                    format!("sagedeploy monitor -e {endpoint} --region {region}"),
                    console_url.clone(),
                ],
            );
        }
        DeployResult::Succeeded {
            endpoint,
            config,
            console_url,
            retired,
            ..
        } => {
            if !retired.is_empty() {
                output.section(
                    "Retired previous resources:",
                    &retired.iter().map(|r| r.to_string()).collect::<Vec<_>>(),
                );
            }
            output.success(&format!("Endpoint {endpoint} is InService on {config}"));
            output.section(
                "Next steps:",
                &[console_url.clone(), describe_command(endpoint)],
            );
        }
        DeployResult::Failed {
            endpoint,
            console_url,
            log_console_url,
            rollback,
            ..
        }
        | DeployResult::TimedOut {
            endpoint,
            console_url,
            log_console_url,
            rollback,
            ..
        } => {
            failure_guidance(output, endpoint, console_url, log_console_url);
            rollback_summary(output, rollback);
        }
    }
}

pub(super) fn failure_guidance(
    output: &Output,
    endpoint: &EndpointName,
    console_url: &str,
    log_console_url: &str,
) {
    output.section(
        "Common causes:",
        &[
            "model artifacts incomplete or the inference code fails to load".to_string(),
            "container image incompatible or missing dependencies".to_string(),
            "execution role lacks permissions on the model artifacts".to_string(),
            "instance type unavailable in this region or over quota".to_string(),
            "model package not approved or not accessible".to_string(),
        ],
    );
    output.section(
        "Where to look:",
        &[
            format!("endpoint logs: {log_console_url}"),
            format!("endpoint: {console_url}"),
            describe_command(endpoint),
        ],
    );
}

pub(super) fn rollback_summary(output: &Output, rollback: &RollbackDisposition) {
    match rollback {
        RollbackDisposition::Completed { report } => {
            if let Some(previous) = &report.restored {
                output.progress(&format!("Endpoint switched back to {previous}"));
            }
            let removed: Vec<String> = report.removed.iter().map(|o| o.resource.to_string()).collect();
            output.section("Rolled back; removed:", &removed);
        }
        RollbackDisposition::Failed { error } => {
            output.warning(&error.to_string());
            output.section("Finish the cleanup by hand:", &error.manual_steps());
        }
        RollbackDisposition::Skipped { manual_steps } => {
            output.section("Rollback skipped; resources left in place. Undo the deployment with:", manual_steps);
        }
    }
}

fn describe_command(endpoint: &EndpointName) -> String {
    format!("aws sagemaker describe-endpoint --endpoint-name {endpoint}")
}
