// ABOUTME: Entry point for the sagedeploy CLI application.
// ABOUTME: Parses arguments, sets up logging, and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::DeployOptions;
use sagedeploy::config::Overrides;
use sagedeploy::deploy::PackageSource;
use sagedeploy::error::Result;
use sagedeploy::output::{Output, OutputMode};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let output = Output::new(mode);

    if let Err(e) = run(cli, output).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli, output: Output) -> Result<()> {
    let mut overrides = Overrides {
        region: cli.region,
        profile: cli.profile,
        ..Default::default()
    };

    match cli.command {
        Commands::Deploy {
            model_package_arn,
            model_package_group,
            instance_type,
            endpoint_name,
            no_monitor,
            skip_rollback,
            update,
            timeout,
            poll_interval,
        } => {
            overrides.timeout = timeout;
            overrides.poll_interval = poll_interval;
            // clap's argument group guarantees one of the two is present.
            let package = match (model_package_arn, model_package_group) {
                (Some(arn), _) => PackageSource::Arn(arn),
                (None, Some(group)) => PackageSource::Group(group),
                (None, None) => PackageSource::Arn(String::new()),
            };
            let options = DeployOptions {
                package,
                instance_type,
                endpoint_name,
                monitor: !no_monitor,
                rollback: !skip_rollback,
                update,
            };
            commands::deploy(options, overrides, output).await
        }
        Commands::Monitor {
            endpoint_name,
            rollback,
            timeout,
        } => {
            overrides.timeout = timeout;
            commands::monitor(&endpoint_name, rollback, overrides, output).await
        }
        Commands::Status { endpoint_name } => {
            commands::status(&endpoint_name, overrides, output).await
        }
        Commands::Teardown {
            endpoint_name,
            config,
            model,
        } => {
            commands::teardown(
                &endpoint_name,
                config.as_deref(),
                model.as_deref(),
                overrides,
                output,
            )
            .await
        }
        Commands::Packages {
            model_package_group,
            all_statuses,
        } => {
            commands::packages(model_package_group.as_deref(), all_statuses, overrides, output)
                .await
        }
    }
}
