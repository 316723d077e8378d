//! failover subcommand
//!
//! Toggles automatic failover on a running coordinator.

use anyhow::Context;
use clap::{Args, ValueEnum};
use failover_common::protocol::FailoverToggle;
use std::time::Duration;

use super::DEFAULT_API_URL;

/// Desired auto-failover state
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailoverState {
    /// Enable automatic failover
    On,
    /// Disable automatic failover
    Off,
}

impl FailoverState {
    /// Whether this state enables failover
    pub fn enabled(self) -> bool {
        matches!(self, Self::On)
    }
}

/// Arguments for the failover subcommand
#[derive(Args, Debug, Clone)]
pub struct FailoverArgs {
    /// Desired state
    #[arg(value_enum)]
    pub state: FailoverState,

    /// Coordinator base URL
    #[arg(short, long, default_value = DEFAULT_API_URL, env = "FAILOVER_URL")]
    pub url: String,
}

/// Execute the failover command
pub async fn execute(args: &FailoverArgs) -> Result<(), anyhow::Error> {
    let url = format!("{}/api/failover", args.url.trim_end_matches('/'));
    let toggle: FailoverToggle = reqwest::Client::new()
        .put(&url)
        .timeout(Duration::from_secs(5))
        .json(&FailoverToggle {
            enabled: args.state.enabled(),
        })
        .send()
        .await
        .with_context(|| format!("failed to reach coordinator at {}", args.url))?
        .error_for_status()?
        .json()
        .await?;

    println!(
        "auto-failover is now {}",
        if toggle.enabled { "on" } else { "off" }
    );
    Ok(())
}
