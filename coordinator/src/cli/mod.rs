//! CLI module for failover-coordinator
//!
//! Provides the command-line interface for running and operating the coordinator.

pub mod failover;
pub mod serve;
pub mod status;

use clap::{Parser, Subcommand};

/// Default base URL used by the client subcommands
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:32780";

/// Failover coordinator - health-driven traffic weighting and primary failover
#[derive(Parser, Debug)]
#[command(name = "failover-coordinator")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    FAILOVER_CONFIG                 Config file path
    FAILOVER__HOST                  Bind address (default: 0.0.0.0)
    FAILOVER__PORT                  Listen port (default: 32780)
    FAILOVER__AUTO_FAILOVER         Initial auto-failover flag (default: true)
    FAILOVER__PROBE__INTERVAL_SECS  Probe interval in seconds (default: 30)
    FAILOVER__PROBE__TIMEOUT_SECS   Probe timeout in seconds (default: 5)
    FAILOVER_LOG_LEVEL              Log level (default: info)
    FAILOVER_LOG_DIR                Also write daily-rotated log files here
    FAILOVER_URL                    Coordinator URL for status/failover commands
"#)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the coordinator (health prober and status API)
    Serve(serve::ServeArgs),
    /// Show the status reported by a running coordinator
    Status(status::StatusArgs),
    /// Enable or disable automatic failover on a running coordinator
    Failover(failover::FailoverArgs),
}
