//! Errors raised while parsing or decoding messages.

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Message parsing and decoding failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A header line has no colon or an empty field name.
    #[error("Malformed header line: {0:?}")]
    InvalidHeader(String),

    /// A `Content-Type` value is missing its type or subtype.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// A quoted-printable body contains a broken escape.
    #[error("Invalid quoted-printable data: {0}")]
    QuotedPrintable(String),

    /// A base64 body failed to decode.
    #[error("Invalid base64 data: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// A multipart content type without a `boundary` parameter.
    #[error("Multipart content type has no boundary")]
    MissingBoundary,

    /// A multipart body that never opens or closes its boundary.
    #[error("Invalid multipart body: {0}")]
    InvalidMultipart(String),
}
