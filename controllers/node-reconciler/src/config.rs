//! Configuration
//!
//! Every flag can also be set through its environment variable; flags win.

use crate::error::ControllerError;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Log output format on stderr
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "luna-node", version, about = "Converge a luna node record to its desired state")]
pub struct Cli {
    /// Request document (YAML or JSON); `-` reads stdin
    #[arg(long, env = "LUNA_REQUEST", default_value = "-")]
    pub request: String,

    /// JSON file holding groups, switches and nodes
    #[arg(long, env = "LUNA_STATE_FILE", default_value = "/var/lib/luna/inventory.json")]
    pub state_file: PathBuf,

    /// Give up on a pass after this many seconds
    #[arg(long, env = "LUNA_RECONCILE_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Passes to run before reporting a failure
    #[arg(long, env = "LUNA_MAX_ATTEMPTS", default_value_t = 1)]
    pub max_attempts: u32,

    #[arg(long, env = "LUNA_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Where the request document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestSource {
    Stdin,
    File(PathBuf),
}

/// Validated runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub request: RequestSource,
    pub state_file: PathBuf,
    pub timeout: Option<Duration>,
    pub max_attempts: u32,
}

impl TryFrom<Cli> for Config {
    type Error = ControllerError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        if cli.max_attempts == 0 {
            return Err(ControllerError::InvalidConfig(
                "max attempts must be at least 1".to_string(),
            ));
        }
        let timeout = match cli.timeout_secs {
            Some(0) => {
                return Err(ControllerError::InvalidConfig(
                    "timeout must be at least 1 second".to_string(),
                ));
            }
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };
        if cli.request.trim().is_empty() {
            return Err(ControllerError::InvalidConfig(
                "request path must not be empty".to_string(),
            ));
        }
        let request = if cli.request == "-" {
            RequestSource::Stdin
        } else {
            RequestSource::File(PathBuf::from(cli.request))
        };

        Ok(Self {
            request,
            state_file: cli.state_file,
            timeout,
            max_attempts: cli.max_attempts,
        })
    }
}
