use super::encoder::{DEFAULT_TOOL_NAME, ValidationError};
use serde::Deserialize;
use serde::de::IgnoredAny;

/// Structural view of a SARIF log.
///
/// Only the fields the upload path needs are kept; everything else in the
/// document is skipped during parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SarifDocument {
    tool_name: Option<String>,
    result_count: usize,
}

#[derive(Debug, Deserialize)]
struct SarifLog {
    #[serde(default)]
    runs: Vec<SarifRun>,
}

#[derive(Debug, Deserialize)]
struct SarifRun {
    tool: Option<SarifTool>,
    #[serde(default)]
    results: Vec<IgnoredAny>,
}

#[derive(Debug, Deserialize)]
struct SarifTool {
    driver: Option<SarifDriver>,
}

#[derive(Debug, Deserialize)]
struct SarifDriver {
    name: Option<String>,
}

impl SarifDocument {
    /// Parse a SARIF log from its raw JSON bytes.
    pub fn parse(raw: &[u8]) -> Result<Self, ValidationError> {
        let log: SarifLog = serde_json::from_slice(raw).map_err(ValidationError::Malformed)?;

        // A log without runs has nothing to report; treat it as empty.
        let Some(first) = log.runs.into_iter().next() else {
            return Ok(Self {
                tool_name: None,
                result_count: 0,
            });
        };

        let tool_name = first
            .tool
            .and_then(|t| t.driver)
            .and_then(|d| d.name)
            .filter(|name| !name.trim().is_empty());

        Ok(Self {
            tool_name,
            result_count: first.results.len(),
        })
    }

    /// Tool name declared by the first run, if any.
    pub fn tool_name(&self) -> Option<&str> {
        self.tool_name.as_deref()
    }

    /// Tool name declared by the first run, or the default display name.
    pub fn tool_name_or_default(&self) -> &str {
        self.tool_name().unwrap_or(DEFAULT_TOOL_NAME)
    }

    /// Number of result entries in the first run.
    pub fn result_count(&self) -> usize {
        self.result_count
    }
}
