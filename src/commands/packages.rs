// ABOUTME: Packages command: list model package groups or the packages in one.
// ABOUTME: Approved packages only unless asked for every status.

use super::{connect, load_settings};
use sagedeploy::cloud::{ApprovalStatus, HostingSnafu, RegistryOps};
use sagedeploy::config::Overrides;
use sagedeploy::error::Result;
use sagedeploy::output::Output;
use snafu::ResultExt;

pub async fn packages(
    group: Option<&str>,
    all_statuses: bool,
    overrides: Overrides,
    output: Output,
) -> Result<()> {
    let settings = load_settings(&overrides)?;
    let session = connect(&settings).await?;
    let hosting = session.hosting();

    let Some(group) = group else {
        let groups = hosting.list_model_package_groups().await.context(HostingSnafu)?;
        output.section("Model package groups:", &groups);
        output.report(&groups);
        return Ok(());
    };

    let filter = (!all_statuses).then_some(ApprovalStatus::Approved);
    let packages = hosting
        .list_model_packages(group, filter.as_ref())
        .await
        .context(HostingSnafu)?;

    let lines: Vec<String> = packages
        .iter()
        .map(|p| {
            format!(
                "v{} {} {} {}",
                p.version.map_or_else(|| "?".to_string(), |v| v.to_string()),
                p.approval,
                p.created_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default(),
                p.arn
            )
        })
        .collect();

    if lines.is_empty() {
        output.warning(&format!("no matching packages in {group}"));
    } else {
        output.section(&format!("Packages in {group}:"), &lines);
    }
    output.report(&packages);
    Ok(())
}
