//! Error types for payload assembly.

use thiserror::Error;

/// Errors that abort building a payload.
///
/// Every other field extraction is total; absence is represented in the
/// payload as `null` or an empty list.
#[derive(Debug, Error)]
pub enum Error {
    /// `send_at` holds neither a string nor a date or date-time.
    #[error("send_at must be a string, date or date-time, found {0}")]
    InvalidSendAtType(String),

    /// `global_merge_vars` arrived as text that is not a JSON document.
    #[error("global_merge_vars is not valid JSON: {0}")]
    MalformedMergeVarsJson(#[source] serde_json::Error),

    /// Rendering a payload or request as JSON failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
