use super::SarifDocument;
use base64::engine::general_purpose::STANDARD;
use base64::write::EncoderStringWriter;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fmt;
use std::io::Write;
use thiserror::Error;

/// Encoded uploads above this size are refused by GitHub.
pub const UPLOAD_SIZE_LIMIT: usize = 10 * 1024 * 1024;

/// Results beyond this count are dropped by GitHub.
pub const TRUNCATION_LIMIT: usize = 5_000;

/// Analyses with more results than this are refused by GitHub.
pub const REJECTION_LIMIT: usize = 25_000;

/// Tool name sent when the SARIF run does not name its driver.
pub const DEFAULT_TOOL_NAME: &str = "Contrast Scan";

/// Reasons a SARIF document cannot be sent to code scanning.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Sarif result limit hit {count} > {limit}. GitHub will reject this analysis")]
    Rejected { count: usize, limit: usize },

    #[error("Encoded sarif is {size} bytes. GitHub will reject an upload over {limit}")]
    Oversized { size: usize, limit: usize },

    #[error("Sarif document is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("Failed to compress sarif document: {0}")]
    Compression(#[source] std::io::Error),
}

/// Non-fatal notice that GitHub will keep only part of the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncationWarning {
    pub count: usize,
    pub limit: usize,
}

impl fmt::Display for TruncationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sarif truncation limit hit {} > {} results. Some results will be truncated",
            self.count, self.limit
        )
    }
}

/// A SARIF document compressed and base64 encoded for the `sarif` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    data: String,
    tool_name: String,
    result_count: usize,
    truncation: Option<TruncationWarning>,
}

impl EncodedPayload {
    /// The base64 text.
    pub fn as_str(&self) -> &str {
        &self.data
    }

    /// Size of the encoded text in bytes.
    pub fn encoded_size(&self) -> usize {
        self.data.len()
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn result_count(&self) -> usize {
        self.result_count
    }

    /// Present when the result count is above the truncation limit.
    pub fn truncation_warning(&self) -> Option<TruncationWarning> {
        self.truncation
    }

    pub fn into_string(self) -> String {
        self.data
    }
}

/// Gates and encodes SARIF documents against code scanning limits.
#[derive(Debug, Clone)]
pub struct SarifEncoder {
    rejection_limit: usize,
    truncation_limit: usize,
    size_limit: usize,
}

impl Default for SarifEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SarifEncoder {
    /// Create an encoder with GitHub's documented limits.
    pub fn new() -> Self {
        Self {
            rejection_limit: REJECTION_LIMIT,
            truncation_limit: TRUNCATION_LIMIT,
            size_limit: UPLOAD_SIZE_LIMIT,
        }
    }

    /// Set the maximum encoded payload size in bytes.
    pub fn with_size_limit(mut self, bytes: usize) -> Self {
        self.size_limit = bytes;
        self
    }

    /// Set the result counts for truncation and rejection.
    pub fn with_result_limits(mut self, truncation: usize, rejection: usize) -> Self {
        self.truncation_limit = truncation;
        self.rejection_limit = rejection;
        self
    }

    /// Validate `document` and encode `raw` as `base64(gzip(raw))`.
    ///
    /// `raw` must be the bytes `document` was parsed from. Count limits are
    /// checked before any compression work; the size limit applies to the
    /// final encoded text.
    pub fn encode(
        &self,
        document: &SarifDocument,
        raw: &[u8],
    ) -> Result<EncodedPayload, ValidationError> {
        let count = document.result_count();
        if count > self.rejection_limit {
            return Err(ValidationError::Rejected {
                count,
                limit: self.rejection_limit,
            });
        }

        let truncation = (count > self.truncation_limit).then_some(TruncationWarning {
            count,
            limit: self.truncation_limit,
        });

        let tool_name = document.tool_name_or_default().to_string();
        let data = compress_and_encode(raw).map_err(ValidationError::Compression)?;

        if data.len() > self.size_limit {
            return Err(ValidationError::Oversized {
                size: data.len(),
                limit: self.size_limit,
            });
        }

        Ok(EncodedPayload {
            data,
            tool_name,
            result_count: count,
            truncation,
        })
    }
}

/// gzip writes straight into the base64 writer, so the compressed bytes are
/// never held separately. The gzip header carries no mtime or file name.
fn compress_and_encode(raw: &[u8]) -> std::io::Result<String> {
    let mut gzip = GzEncoder::new(EncoderStringWriter::new(&STANDARD), Compression::default());
    gzip.write_all(raw)?;
    Ok(gzip.finish()?.into_inner())
}
