//! status subcommand
//!
//! Displays the status reported by a running coordinator.

use clap::Args;
use failover_common::protocol::StatusReport;
use std::time::Duration;

use super::DEFAULT_API_URL;

/// Arguments for the status subcommand
#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    /// Coordinator base URL
    #[arg(short, long, default_value = DEFAULT_API_URL, env = "FAILOVER_URL")]
    pub url: String,

    /// Print the raw JSON report
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// Execute the status command
pub async fn execute(args: &StatusArgs) -> Result<(), anyhow::Error> {
    let url = format!("{}/api/status", args.url.trim_end_matches('/'));
    let report: StatusReport = reqwest::Client::new()
        .get(&url)
        .timeout(Duration::from_secs(5))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render(&report));
    }
    Ok(())
}

/// Render a status report as a table
pub fn render(report: &StatusReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "auto-failover: {}  failed-over: {}  summary: {} ({:?})\n",
        if report.auto_failover_enabled { "on" } else { "off" },
        if report.failed_over { "yes" } else { "no" },
        report.summary,
        report.summary.overall,
    ));
    out.push_str("ID\tROLE\tHEALTH\tLATENCY\tLOAD\tWEIGHT\tROUTABLE\tLAST ERROR\n");
    for status in &report.endpoints {
        let endpoint = &status.endpoint;
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{:.1}\t{:.3}\t{}\t{}\n",
            endpoint.id,
            endpoint.role,
            endpoint.health,
            endpoint
                .response_time_ms
                .map(|ms| format!("{}ms", ms))
                .unwrap_or_else(|| "-".to_string()),
            endpoint.load,
            status.weight,
            if status.routable { "yes" } else { "no" },
            endpoint.last_error.as_deref().unwrap_or("-"),
        ));
    }
    out
}
