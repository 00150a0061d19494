//! # mailpayload
//!
//! Turns an already-composed MIME message into the JSON message object of a
//! transactional email API (Mandrill `messages/send` shape).
//!
//! Provider options travel on the message as custom headers named after the
//! provider field (`track_opens`, `tags`, `global_merge_vars`, `send_at`,
//! ...). Boolean-like fields are read as tri-states, structured fields are
//! read through the header's verbatim value, and attachments are split into
//! regular files and inline images.
//!
//! ## Example
//!
//! ```ignore
//! use mailpayload::to_payload;
//! use mailpayload_mime::Message;
//!
//! let message = Message::parse(raw)?;
//! let payload = to_payload(&message)?;
//! println!("{}", payload.to_json()?);
//! ```
//!
//! ## Send requests
//!
//! ```ignore
//! use mailpayload::{Config, PayloadAssembler};
//!
//! let assembler = PayloadAssembler::new(Config::builder().send_async(true).build());
//! let request = assembler.request(&message)?;
//! // POST request.to_json()? to request.endpoint()
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod address;
pub mod attachment;
mod config;
mod error;
mod field;
pub mod headers;
mod payload;
pub mod raw;
mod request;
pub mod send_at;
pub mod tags;
pub mod tristate;

pub use address::AddressField;
pub use attachment::{AttachmentField, Classified};
pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use field::{ExtensionField, FieldReader};
pub use headers::HeaderMap;
pub use payload::{Payload, PayloadAssembler, to_payload};
pub use request::SendRequest;
pub use tristate::TriState;
