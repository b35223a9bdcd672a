pub mod cli;
pub mod config;
pub mod delivery;
pub mod error;
pub mod handlers;
pub mod orchestrator;
pub mod pipeline;
pub mod platform;
pub mod prescan;
pub mod sarif;

#[cfg(test)]
pub mod test_utils;

pub use cli::Cli;
pub use config::{ConfigError, GitHubContext, PlatformCredentials};
pub use delivery::{
    DeliveryError, DeliveryOutcome, DeliveryRequest, ResultDelivery, ResultDeliveryClient,
};
pub use error::{Result, ScanError};
pub use orchestrator::{ScanOrchestrator, ScanRequest, scan_url};
pub use pipeline::{CompletionAwaiter, CompletionSignal, ScanCompletionPipeline};
pub use platform::{HttpScanPlatform, ScanHandle, ScanPlatform, ScanStatus, ScanSummary};
pub use sarif::{EncodedPayload, SarifDocument, SarifEncoder, ValidationError};
