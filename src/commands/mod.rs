// ABOUTME: Command module aggregator for the sagedeploy CLI.
// ABOUTME: Re-exports command handlers and the settings/session helpers they share.

mod deploy;
mod monitor;
mod packages;
mod status;
mod teardown;

pub use deploy::{DeployOptions, deploy};
pub use monitor::monitor;
pub use packages::packages;
pub use status::status;
pub use teardown::teardown;

use sagedeploy::cloud::{AwsSession, CredentialSource, SessionError, SessionSnafu};
use sagedeploy::config::{Config, Overrides, Settings};
use sagedeploy::error::Result;
use snafu::ResultExt;
use std::env;

/// Discover the config file in the working directory and layer env and flags over it.
fn load_settings(overrides: &Overrides) -> Result<Settings> {
    let cwd = env::current_dir()?;
    let file = Config::discover(&cwd)?;
    Settings::from_env(file, overrides)
}

/// Build the AWS session every collaborator shares.
async fn connect(settings: &Settings) -> Result<AwsSession> {
    let region = settings
        .region
        .clone()
        .ok_or(SessionError::MissingRegion)
        .context(SessionSnafu)?;
    let source = CredentialSource::from_env(settings.profile.as_deref()).context(SessionSnafu)?;
    tracing::debug!(region = %region, credentials = %source.describe(), "connecting");
    Ok(AwsSession::connect(&region, source).await)
}
