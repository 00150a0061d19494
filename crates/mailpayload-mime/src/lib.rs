//! # mailpayload-mime
//!
//! MIME message model used as the source side of payload adapters.
//!
//! ## Features
//!
//! - **Ordered headers**: declaration order, original name case, duplicates
//! - **Two reads per header**: the verbatim [`FieldValue`] as supplied and a
//!   formatted text rendering
//! - **Typed values**: text, structured JSON, date-times and dates
//! - **Parsing**: raw RFC 5322 messages with nested multiparts
//! - **Decoding**: Base64, Quoted-Printable, RFC 2047 encoded-words
//! - **Addresses**: display-name / address splitting for address lists
//!
//! ## Quick Start
//!
//! ### Parsing a message
//!
//! ```ignore
//! use mailpayload_mime::Message;
//!
//! let message = Message::parse(raw)?;
//! println!("Subject: {}", message.subject().unwrap_or_default());
//! for part in message.attachments() {
//!     println!("{:?} {:?}", part.filename(), part.mime_type());
//! }
//! ```
//!
//! ### Building a message in memory
//!
//! ```ignore
//! use mailpayload_mime::{Headers, Message};
//! use serde_json::json;
//!
//! let mut headers = Headers::new();
//! headers.add("From", "Sender <sender@example.com>");
//! headers.add("To", "recipient@example.com");
//! headers.add("global_merge_vars", json!([{"name": "FNAME", "content": "Jane"}]));
//!
//! let message = Message::single_part(headers, b"Hello".to_vec());
//! let field = message.header("global_merge_vars").unwrap();
//! // Structured value as supplied vs. its folded text rendering
//! let original = field.original_value();
//! let formatted = field.formatted_value();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use address::Mailbox;
pub use content_type::{ContentDisposition, ContentType, DispositionType};
pub use error::{Error, Result};
pub use header::{FieldValue, HeaderField, Headers};
pub use message::{Message, Part, TransferEncoding};
