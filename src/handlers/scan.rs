//! Remote scan handler.

use super::HandlerResult;
use crate::cli::Cli;
use crate::config::{GitHubContext, PlatformCredentials};
use crate::delivery::ResultDeliveryClient;
use crate::error::Result;
use crate::orchestrator::{ScanOrchestrator, ScanRequest};
use crate::platform::HttpScanPlatform;
use colored::Colorize;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;

/// Run a scan configured from `cli` and the process environment.
pub fn run_remote_scan(cli: &Cli) -> ExitCode {
    let result = match execute_scan(cli, |name| std::env::var(name).ok()) {
        Ok(ack) => {
            debug!(ack = %ack, "GitHub acknowledged the analysis");
            println!(
                "{}",
                "Contrast Scan results uploaded to GitHub code scanning"
                    .green()
                    .bold()
            );
            HandlerResult::Success
        }
        Err(err) => {
            eprintln!("{} {}", "Error:".red().bold(), err);
            HandlerResult::from_error(&err)
        }
    };
    result.into()
}

/// Run a scan, reading environment variables through `lookup`.
pub fn execute_scan<F>(cli: &Cli, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let creds = PlatformCredentials::from_lookup(&lookup)?;
    let github = GitHubContext::from_lookup(&lookup)?;

    let platform = HttpScanPlatform::new(&cli.url, &creds)?;
    let delivery = ResultDeliveryClient::new(&github)?;

    let orchestrator =
        ScanOrchestrator::new(Arc::new(platform), Arc::new(delivery), github, cli.url.clone())?
            .with_timeout(cli.timeout())
            .with_poll_interval(cli.poll_interval());
    orchestrator.interrupt_on_ctrl_c();

    orchestrator.run(&ScanRequest {
        source_dir: cli.src_dir.clone(),
        prescan_out: cli.prescan_out.clone(),
        sarif_out: cli.sarif_out.clone(),
        artifact: cli.artifact.clone(),
    })
}
