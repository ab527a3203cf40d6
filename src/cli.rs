// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands, their arguments, and the global output flags.

use clap::{ArgGroup, Parser, Subcommand};
use sagedeploy::types::DEFAULT_INSTANCE_TYPE;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "sagedeploy")]
#[command(about = "Deploy registered models to SageMaker endpoints and watch them go live")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print only the final result
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Emit JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// AWS region (overrides AWS_REGION and the config file)
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// AWS profile (overrides AWS_PROFILE and the config file)
    #[arg(long, global = true)]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy a model package to an endpoint and monitor it until InService
    #[command(group(ArgGroup::new("package").required(true).args(["model_package_arn", "model_package_group"])))]
    Deploy {
        /// Model package ARN to deploy
        #[arg(short = 'a', long)]
        model_package_arn: Option<String>,

        /// Deploy the newest approved package of this group
        #[arg(short = 'g', long)]
        model_package_group: Option<String>,

        /// Hosting instance type
        #[arg(short = 't', long, default_value = DEFAULT_INSTANCE_TYPE)]
        instance_type: String,

        /// Endpoint name (default: <prefix>-<UTC timestamp>)
        #[arg(short = 'e', long)]
        endpoint_name: Option<String>,

        /// Submit the requests and exit without waiting for InService
        #[arg(long)]
        no_monitor: bool,

        /// Leave resources in place when the deployment fails
        #[arg(long)]
        skip_rollback: bool,

        /// Roll the new model onto an existing endpoint
        #[arg(long)]
        update: bool,

        /// Give up waiting after this long (e.g. 30m)
        #[arg(long, value_parser = humantime::parse_duration)]
        timeout: Option<Duration>,

        /// Time between status checks (e.g. 30s)
        #[arg(long, value_parser = humantime::parse_duration)]
        poll_interval: Option<Duration>,
    },

    /// Watch an existing endpoint until it settles
    Monitor {
        #[arg(short = 'e', long)]
        endpoint_name: String,

        /// Delete the endpoint and its configuration if it fails
        #[arg(long)]
        rollback: bool,

        #[arg(long, value_parser = humantime::parse_duration)]
        timeout: Option<Duration>,
    },

    /// Show an endpoint's current status
    Status {
        #[arg(short = 'e', long)]
        endpoint_name: String,
    },

    /// Delete an endpoint, its configuration, and its model
    Teardown {
        #[arg(short = 'e', long)]
        endpoint_name: String,

        /// Endpoint configuration to delete (default: the one the endpoint uses)
        #[arg(long)]
        config: Option<String>,

        /// Model to delete (default: the one behind the configuration)
        #[arg(long)]
        model: Option<String>,
    },

    /// List model packages, or package groups when no group is given
    Packages {
        #[arg(short = 'g', long)]
        model_package_group: Option<String>,

        /// Include packages that are not approved
        #[arg(long)]
        all_statuses: bool,
    },
}
