// ABOUTME: Status command: describe an endpoint once.
// ABOUTME: Shows status, bound configuration, failure reason, and variant capacity.

use super::{connect, load_settings};
use sagedeploy::cloud::{CloudError, EndpointOps, HostingError, endpoint_console_url};
use sagedeploy::config::Overrides;
use sagedeploy::deploy::DeployError;
use sagedeploy::error::Result;
use sagedeploy::output::Output;
use sagedeploy::types::EndpointName;

pub async fn status(endpoint: &str, overrides: Overrides, output: Output) -> Result<()> {
    let endpoint =
        EndpointName::new(endpoint).map_err(|e| DeployError::Validation(vec![e.to_string()]))?;
    let settings = load_settings(&overrides)?;
    let session = connect(&settings).await?;
    let hosting = session.hosting();

    let description = match hosting.describe_endpoint(&endpoint).await {
        Ok(description) => description,
        Err(HostingError::NotFound(_)) => return Err(DeployError::NotFound(endpoint).into()),
        Err(source) => return Err(CloudError::Hosting { source }.into()),
    };

    let mut lines = vec![
        format!("Status: {}", description.status),
        format!(
            "Configuration: {}",
            description.config_name.as_deref().unwrap_or("-")
        ),
    ];
    if let Some(created) = description.created_at {
        lines.push(format!("Created: {}", created.to_rfc3339()));
    }
    if let Some(modified) = description.last_modified_at {
        lines.push(format!("Last modified: {}", modified.to_rfc3339()));
    }
    for variant in &description.variants {
        lines.push(format!(
            "Variant {}: {} of {} instance(s)",
            variant.name,
            variant
                .current_instance_count
                .map_or_else(|| "?".to_string(), |n| n.to_string()),
            variant
                .desired_instance_count
                .map_or_else(|| "?".to_string(), |n| n.to_string()),
        ));
    }
    if let Some(reason) = &description.failure_reason {
        lines.push(format!("Failure reason: {reason}"));
    }
    lines.push(endpoint_console_url(session.region(), &endpoint));

    output.section(&format!("Endpoint {endpoint}"), &lines);
    output.report(&description);
    Ok(())
}
