// ABOUTME: Teardown command: run the rollback controller by hand.
// ABOUTME: Deletes an endpoint and, unless named explicitly, the configuration and model it uses.

use super::deploy::rollback_summary;
use super::{connect, load_settings};
use sagedeploy::cloud::HostingSnafu;
use sagedeploy::config::Overrides;
use sagedeploy::deploy::{DeployError, RollbackController, RollbackDisposition, RollbackTarget};
use sagedeploy::error::Result;
use sagedeploy::output::Output;
use sagedeploy::types::{EndpointConfigName, EndpointName, ModelName};
use snafu::ResultExt;

pub async fn teardown(
    endpoint: &str,
    config: Option<&str>,
    model: Option<&str>,
    overrides: Overrides,
    mut output: Output,
) -> Result<()> {
    output.start_timer();
    let invalid = |e: &dyn std::fmt::Display| DeployError::Validation(vec![e.to_string()]);
    let endpoint = EndpointName::new(endpoint).map_err(|e| invalid(&e))?;
    let config = config
        .map(EndpointConfigName::new)
        .transpose()
        .map_err(|e| invalid(&e))?;
    let model = model
        .map(ModelName::new)
        .transpose()
        .map_err(|e| invalid(&e))?;

    let settings = load_settings(&overrides)?;
    let session = connect(&settings).await?;
    let hosting = session.hosting();

    let mut target = RollbackTarget::discover(&hosting, &endpoint)
        .await
        .context(HostingSnafu)?;
    if config.is_some() {
        target.config = config;
    }
    if model.is_some() {
        target.model = model;
    }

    output.progress(&format!("Tearing down {endpoint}"));
    let controller = RollbackController::new(&hosting, settings.rollback.clone());
    let disposition = match controller.rollback(&target).await {
        Ok(report) => RollbackDisposition::Completed { report },
        Err(error) => RollbackDisposition::Failed { error },
    };
    rollback_summary(&output, &disposition);
    output.report(&disposition);

    match disposition {
        RollbackDisposition::Failed { error } => Err(DeployError::Rollback(error).into()),
        _ => {
            output.success(&format!("Removed {endpoint}"));
            Ok(())
        }
    }
}
