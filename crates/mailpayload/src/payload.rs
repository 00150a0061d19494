//! Payload assembly.

use crate::address::{self, AddressField};
use crate::attachment::{self, AttachmentField};
use crate::config::Config;
use crate::error::Result;
use crate::field::{ExtensionField, FieldReader};
use crate::headers::{self, HeaderMap};
use crate::raw;
use crate::send_at;
use crate::tags;
use crate::tristate::{self, TriState};
use mailpayload_mime::encoding::decode_charset;
use mailpayload_mime::{Message, Part};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Charset assumed for bodies that do not declare one.
const DEFAULT_CHARSET: &str = "utf-8";

/// The message object sent to the provider.
///
/// Every field is always serialized except `attachments` and `images`,
/// which are omitted entirely when there is nothing to send.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    /// Generate an HTML part from the text part.
    pub auto_html: TriState,
    /// Generate a text part from the HTML part.
    pub auto_text: TriState,
    /// Address receiving a copy of every message.
    pub bcc_address: Option<String>,
    /// Sender address.
    pub from_email: Option<String>,
    /// Sender display name.
    pub from_name: Option<String>,
    /// Merge variables shared by all recipients.
    pub global_merge_vars: Option<Value>,
    /// Every message header, last value wins.
    pub headers: HeaderMap,
    /// HTML body.
    pub html: Option<String>,
    /// Send ahead of non-important messages.
    pub important: bool,
    /// Inline CSS styles in the HTML body.
    pub inline_css: TriState,
    /// Process merge tags.
    pub merge: TriState,
    /// Merge tag language.
    pub merge_language: Option<String>,
    /// Per-recipient merge variables.
    pub merge_vars: Option<Value>,
    /// Custom metadata.
    pub metadata: Option<Value>,
    /// Show every recipient in the To header.
    pub preserve_recipients: TriState,
    /// Domain for the return path.
    pub return_path_domain: Option<String>,
    /// Scheduled send time, `YYYY-MM-DD HH:MM:SS` UTC.
    pub send_at: Option<String>,
    /// Domain for DKIM signing.
    pub signing_domain: Option<String>,
    /// Subaccount to send under.
    pub subaccount: Option<String>,
    /// Subject line.
    pub subject: Option<String>,
    /// Tags for reporting.
    pub tags: Vec<String>,
    /// Plain-text body.
    pub text: Option<String>,
    /// Recipients from To, Cc and Bcc.
    pub to: Vec<AddressField>,
    /// Rewrite links for click tracking.
    pub track_clicks: TriState,
    /// Add an open-tracking pixel.
    pub track_opens: TriState,
    /// Domain for tracking links.
    pub tracking_domain: Option<String>,
    /// Strip query strings from tracked URLs.
    pub url_strip_qs: TriState,
    /// Link to the sent content from the dashboard.
    pub view_content_link: TriState,
    /// Regular attachments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<AttachmentField>>,
    /// Inline images referenced by content-id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<AttachmentField>>,
}

impl Payload {
    /// Converts the payload to a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(Into::into)
    }

    /// Renders the payload as JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Into::into)
    }
}

/// Builds payloads from messages.
///
/// Stateless apart from its configuration; one assembler can serve any
/// number of messages, from any number of threads.
#[derive(Debug, Clone, Default)]
pub struct PayloadAssembler {
    config: Config,
}

impl PayloadAssembler {
    /// Creates an assembler with the given configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Builds the payload for `message`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSendAtType`] or
    /// [`Error::MalformedMergeVarsJson`]; no partial payload is produced.
    ///
    /// [`Error::InvalidSendAtType`]: crate::Error::InvalidSendAtType
    /// [`Error::MalformedMergeVarsJson`]: crate::Error::MalformedMergeVarsJson
    pub fn assemble(&self, message: &Message) -> Result<Payload> {
        let sender = address::sender(message);
        let classified = attachment::classify(message);
        let send_at = raw::original(message, ExtensionField::SendAt)
            .map(|value| send_at::format(value, &self.config))
            .transpose()?;

        let payload = Payload {
            auto_html: tristate::read(message, ExtensionField::AutoHtml),
            auto_text: tristate::read(message, ExtensionField::AutoText),
            bcc_address: text(message, ExtensionField::BccAddress),
            from_email: sender.as_ref().map(|from| from.email.clone()),
            from_name: sender.map(|from| from.name),
            global_merge_vars: raw::json_value(message, ExtensionField::GlobalMergeVars)?,
            headers: headers::collect(message),
            html: body(message, message.html_part(), "text/html"),
            important: tristate::read_flag(message, ExtensionField::Important),
            inline_css: tristate::read(message, ExtensionField::InlineCss),
            merge: tristate::read(message, ExtensionField::Merge),
            merge_language: text(message, ExtensionField::MergeLanguage),
            merge_vars: raw::json_value(message, ExtensionField::MergeVars)?,
            metadata: raw::json_value(message, ExtensionField::Metadata)?,
            preserve_recipients: tristate::read(message, ExtensionField::PreserveRecipients),
            return_path_domain: text(message, ExtensionField::ReturnPathDomain),
            send_at,
            signing_domain: text(message, ExtensionField::SigningDomain),
            subaccount: text(message, ExtensionField::Subaccount),
            subject: message.subject(),
            tags: tags::read(message),
            text: body(message, message.text_part(), "text/plain"),
            to: address::recipients(message),
            track_clicks: tristate::read(message, ExtensionField::TrackClicks),
            track_opens: tristate::read(message, ExtensionField::TrackOpens),
            tracking_domain: text(message, ExtensionField::TrackingDomain),
            url_strip_qs: tristate::read(message, ExtensionField::UrlStripQs),
            view_content_link: tristate::read(message, ExtensionField::ViewContentLink),
            attachments: non_empty(classified.regular),
            images: non_empty(classified.inline),
        };

        debug!(
            recipients = payload.to.len(),
            attachments = payload.attachments.as_ref().map_or(0, Vec::len),
            images = payload.images.as_ref().map_or(0, Vec::len),
            "Assembled payload"
        );
        Ok(payload)
    }
}

/// Builds the payload for `message` with the default configuration.
///
/// # Errors
///
/// See [`PayloadAssembler::assemble`].
pub fn to_payload(message: &Message) -> Result<Payload> {
    PayloadAssembler::default().assemble(message)
}

/// Reads a plain-text extension header.
pub(crate) fn text(message: &Message, field: ExtensionField) -> Option<String> {
    debug_assert_eq!(field.reader(), FieldReader::Text);
    message.headers.get_text(field.header_name())
}

/// Picks the typed body part, or the whole body when the message itself
/// is exactly `mime_type`, and decodes it in its declared charset.
fn body(message: &Message, part: Option<&Part>, mime_type: &str) -> Option<String> {
    if let Some(part) = part {
        let bytes = part.decode_body().unwrap_or_else(|e| {
            warn!(?e, mime_type, "Body part failed to decode, using raw bytes");
            part.body.clone()
        });
        return Some(body_text(part.charset().as_deref(), &bytes));
    }

    if message.mime_type().as_deref() != Some(mime_type) {
        return None;
    }
    let bytes = message.decoded_body().unwrap_or_else(|e| {
        warn!(?e, mime_type, "Body failed to decode, using raw bytes");
        message.body.clone()
    })?;
    Some(body_text(message.charset().as_deref(), &bytes))
}

fn body_text(charset: Option<&str>, bytes: &[u8]) -> String {
    decode_charset(charset.unwrap_or(DEFAULT_CHARSET), bytes)
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use crate::Error;
    use chrono::{TimeZone, Utc};
    use mailpayload_mime::Headers;
    use serde_json::json;

    const WIRE_KEYS: [&str; 28] = [
        "auto_html",
        "auto_text",
        "bcc_address",
        "from_email",
        "from_name",
        "global_merge_vars",
        "headers",
        "html",
        "important",
        "inline_css",
        "merge",
        "merge_language",
        "merge_vars",
        "metadata",
        "preserve_recipients",
        "return_path_domain",
        "send_at",
        "signing_domain",
        "subaccount",
        "subject",
        "tags",
        "text",
        "to",
        "track_clicks",
        "track_opens",
        "tracking_domain",
        "url_strip_qs",
        "view_content_link",
    ];

    fn plain_message() -> Message {
        let mut headers = Headers::new();
        headers.add("From", "Sender <sender@x.com>");
        headers.add("To", "a@x.com");
        headers.add("Subject", "Hello");
        Message::single_part(headers, b"Hi there".to_vec())
    }

    #[test]
    fn test_plain_message_defaults() {
        let payload = to_payload(&plain_message()).unwrap();

        assert_eq!(payload.from_email.as_deref(), Some("sender@x.com"));
        assert_eq!(payload.from_name.as_deref(), Some("Sender"));
        assert_eq!(payload.subject.as_deref(), Some("Hello"));
        assert_eq!(payload.text.as_deref(), Some("Hi there"));
        assert_eq!(payload.html, None);
        assert!(!payload.important);
        assert_eq!(payload.auto_html, TriState::Absent);
        assert!(payload.tags.is_empty());
        assert!(payload.attachments.is_none());
        assert!(payload.images.is_none());
    }

    #[test]
    fn test_wire_keys() {
        let value = to_payload(&plain_message()).unwrap().to_value().unwrap();
        let object = value.as_object().unwrap();

        let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, WIRE_KEYS);
        assert_eq!(object["track_opens"], json!(null));
        assert_eq!(object["tags"], json!([]));
    }

    #[test]
    fn test_html_single_part() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/html; charset=utf-8");
        headers.add("Content-Transfer-Encoding", "base64");
        let message = Message::single_part(headers, b"PGI+SGk8L2I+".to_vec());
        let payload = to_payload(&message).unwrap();

        assert_eq!(payload.html.as_deref(), Some("<b>Hi</b>"));
        assert_eq!(payload.text, None);
    }

    #[test]
    fn test_other_content_type_has_no_body() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "application/json");
        let message = Message::single_part(headers, b"{}".to_vec());
        let payload = to_payload(&message).unwrap();

        assert_eq!(payload.html, None);
        assert_eq!(payload.text, None);
    }

    #[test]
    fn test_extension_fields() {
        let mut message = plain_message();
        message.headers.add("important", "true");
        message.headers.add("merge_language", "handlebars");
        message.headers.add("subaccount", "customer-123");
        message.headers.add("preserve_recipients", "false");
        message.headers.add("tags", "a, b");
        message.headers.add("metadata", json!({"user_id": 42}));
        message
            .headers
            .add("send_at", Utc.with_ymd_and_hms(2024, 3, 1, 13, 5, 9).unwrap());
        let payload = to_payload(&message).unwrap();

        assert!(payload.important);
        assert_eq!(payload.merge_language.as_deref(), Some("handlebars"));
        assert_eq!(payload.subaccount.as_deref(), Some("customer-123"));
        assert_eq!(payload.preserve_recipients, TriState::False);
        assert_eq!(payload.tags, ["a", "b"]);
        assert_eq!(payload.metadata, Some(json!({"user_id": 42})));
        assert_eq!(payload.send_at.as_deref(), Some("2024-03-01 13:05:09"));
        assert_eq!(payload.headers.get("merge_language"), Some("handlebars"));
    }

    #[test]
    fn test_invalid_send_at_aborts() {
        let mut message = plain_message();
        message.headers.add("send_at", json!(42));
        assert!(matches!(to_payload(&message), Err(Error::InvalidSendAtType(_))));
    }

    #[test]
    fn test_malformed_merge_vars_aborts() {
        let mut message = plain_message();
        message.headers.add("global_merge_vars", "not json");
        assert!(matches!(to_payload(&message), Err(Error::MalformedMergeVarsJson(_))));
    }

    #[test]
    fn test_missing_from() {
        let message = Message::single_part(Headers::new(), Vec::new());
        let payload = to_payload(&message).unwrap();
        assert_eq!(payload.from_email, None);
        assert_eq!(payload.from_name, None);
        assert_eq!(payload.subject, None);
        assert!(payload.to.is_empty());
        assert_eq!(payload.text.as_deref(), Some(""));
    }
}
