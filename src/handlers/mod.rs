//! CLI command handlers.
//!
//! Kept apart from main.rs so exit code mapping can be unit tested.

mod scan;

use crate::error::ScanError;
use std::process::ExitCode;

pub use scan::{execute_scan, run_remote_scan};

/// Exit code for configuration and usage errors.
pub const USAGE_EXIT_CODE: u8 = 2;

/// Exit code for scan, validation and delivery failures.
pub const FAILURE_EXIT_CODE: u8 = 1;

/// Result type for handler functions that can be tested.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerResult {
    Success,
    Error(u8),
}

impl HandlerResult {
    pub fn from_error(err: &ScanError) -> Self {
        if err.is_config() {
            Self::Error(USAGE_EXIT_CODE)
        } else {
            Self::Error(FAILURE_EXIT_CODE)
        }
    }
}

impl From<HandlerResult> for ExitCode {
    fn from(result: HandlerResult) -> Self {
        match result {
            HandlerResult::Success => ExitCode::SUCCESS,
            HandlerResult::Error(code) => ExitCode::from(code),
        }
    }
}
