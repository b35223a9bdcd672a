//! SARIF handling for GitHub code scanning uploads.
//!
//! The document itself is treated as opaque. Only the first run's tool name
//! and result count are read, which is all the upload limits depend on.

pub mod document;
pub mod encoder;

pub use document::SarifDocument;
pub use encoder::{
    DEFAULT_TOOL_NAME, EncodedPayload, REJECTION_LIMIT, SarifEncoder, TRUNCATION_LIMIT,
    TruncationWarning, UPLOAD_SIZE_LIMIT, ValidationError,
};
