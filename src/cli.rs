use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Contrast platform used when `--url` is not given.
pub const DEFAULT_API_URL: &str = "https://app.contrastsecurity.com/Contrast";

#[derive(Parser, Debug)]
#[command(
    name = "contrast-scan",
    version,
    about = "Perform a Contrast Scan in a GitHub Action",
    long_about = "contrast-scan uploads a built artifact to Contrast Scan, waits for the scan to finish and sends the SARIF results to GitHub code scanning."
)]
pub struct Cli {
    /// Artifact to scan (jar, war or zip)
    pub artifact: PathBuf,

    /// Where to find the source tree of the project
    #[arg(short = 'd', long = "src-dir", default_value = ".")]
    pub src_dir: PathBuf,

    /// Where to write the pre-scan manifest
    #[arg(short = 'm', long = "prescan-out", default_value = "../prescan.json")]
    pub prescan_out: PathBuf,

    /// Where to write the SARIF results
    #[arg(short = 's', long = "sarif-out", default_value = "../results.sarif")]
    pub sarif_out: PathBuf,

    /// Contrast Platform API url
    #[arg(short = 'u', long, default_value = DEFAULT_API_URL)]
    pub url: Url,

    /// Seconds to wait for scan results before giving up
    #[arg(long, default_value_t = 600, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Seconds between scan status checks
    #[arg(long = "poll-interval", default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval: u64,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }
}
