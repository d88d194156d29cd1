//! Luna Node Reconciler
//!
//! Converges one luna node record to the state described by a request document:
//! - `state: present` creates the node if needed and sets its fields, relations,
//!   MAC and interface addresses
//! - `state: absent` deletes the node if it exists
//!
//! The outcome is printed on stdout as `{changed, failed, msg, meta}`.

mod backoff;
mod config;
mod controller;
mod error;
mod log;
mod reconciler;
#[cfg(test)]
mod test_utils;

use clap::Parser;
use config::{Cli, Config, LogFormat, RequestSource};
use controller::{Controller, ModuleOutput};
use crate::error::ControllerError;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    info!("Starting luna node reconciler");

    let output = match run(cli).await {
        Ok(output) => output,
        Err(e) => {
            error!("Reconciler failed: {}", e);
            ModuleOutput::from_error(&e)
        }
    };

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            error!("Failed to serialize output: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if output.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn run(cli: Cli) -> Result<ModuleOutput, ControllerError> {
    let config = Config::try_from(cli)?;

    info!("Configuration:");
    info!("  State file: {}", config.state_file.display());
    match &config.request {
        RequestSource::Stdin => info!("  Request: stdin"),
        RequestSource::File(path) => info!("  Request: {}", path.display()),
    }
    info!(
        "  Timeout: {}",
        config.timeout.map_or_else(|| "none".to_string(), |t| format!("{}s", t.as_secs()))
    );
    info!("  Max attempts: {}", config.max_attempts);

    let controller = Controller::new(config).await?;
    let request = controller.read_request().await?;
    controller.run(request).await
}

/// Logs go to stderr so stdout carries only the JSON output
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
