//! MIME message structure and handling.

use crate::address::Mailbox;
use crate::content_type::{ContentDisposition, ContentType, DispositionType};
use crate::encoding::{decode_base64, decode_encoded_words, decode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::{HeaderField, Headers};
use std::fmt;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }

    /// Decodes `body` according to this encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid for the encoding.
    pub fn decode(self, body: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Base64 => decode_base64(&String::from_utf8_lossy(body)),
            Self::QuotedPrintable => decode_quoted_printable(&String::from_utf8_lossy(body)),
            Self::SevenBit | Self::EightBit | Self::Binary => Ok(body.to_vec()),
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// MIME message part.
///
/// A multipart part has children in `parts` and an empty `body`.
#[derive(Debug, Clone, Default)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body (raw, still transfer-encoded bytes).
    pub body: Vec<u8>,
    /// Child parts of a multipart part.
    pub parts: Vec<Part>,
}

impl Part {
    /// Creates a new leaf part.
    #[must_use]
    pub const fn new(headers: Headers, body: Vec<u8>) -> Self {
        Self {
            headers,
            body,
            parts: Vec::new(),
        }
    }

    /// Creates a multipart part holding `parts`.
    #[must_use]
    pub const fn multipart(headers: Headers, parts: Vec<Self>) -> Self {
        Self {
            headers,
            body: Vec::new(),
            parts,
        }
    }

    /// Parses a part from raw text (headers, blank line, body).
    ///
    /// # Errors
    ///
    /// Returns an error if the headers or a nested multipart are malformed.
    pub fn parse(raw: &str) -> Result<Self> {
        let (header_text, body) = split_header_body(raw);
        let headers = Headers::parse(header_text)?;
        let content_type = content_type_of(&headers)?;

        if content_type.is_multipart() {
            let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;
            let parts = split_multipart(body, boundary)?;
            return Ok(Self::multipart(headers, parts));
        }

        Ok(Self::new(headers, body.as_bytes().to_vec()))
    }

    /// Gets the content type, defaulting to `text/plain`.
    ///
    /// # Errors
    ///
    /// Returns an error if content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        content_type_of(&self.headers)
    }

    /// Gets the bare `type/subtype`, or `None` when the header is invalid.
    #[must_use]
    pub fn mime_type(&self) -> Option<String> {
        self.content_type().ok().map(|ct| ct.mime_type())
    }

    /// Gets the declared `charset` of a `text/*` part.
    #[must_use]
    pub fn charset(&self) -> Option<String> {
        charset_of(&self.headers)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get_text("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, |enc| TransferEncoding::parse(&enc))
    }

    /// Gets the parsed `Content-Disposition`, if any.
    #[must_use]
    pub fn disposition(&self) -> Option<ContentDisposition> {
        self.headers
            .get_text("content-disposition")
            .map(|value| ContentDisposition::parse(&value))
    }

    /// Gets the filename from the disposition or the content type `name`.
    #[must_use]
    pub fn filename(&self) -> Option<String> {
        self.disposition()
            .and_then(|cd| cd.filename().map(decode_encoded_words))
            .or_else(|| {
                self.content_type()
                    .ok()
                    .and_then(|ct| ct.name().map(decode_encoded_words))
            })
    }

    /// Gets the `Content-ID` without its angle brackets.
    #[must_use]
    pub fn content_id(&self) -> Option<String> {
        self.headers.get_text("content-id").map(|id| {
            id.trim()
                .trim_start_matches('<')
                .trim_end_matches('>')
                .to_string()
        })
    }

    /// Checks if this part is a container of other parts.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        !self.parts.is_empty() || self.content_type().is_ok_and(|ct| ct.is_multipart())
    }

    /// Checks if this part is an attachment rather than a body.
    ///
    /// A leaf part is an attachment when it has an `attachment`
    /// disposition, a filename, or a content-id. A bare `inline`
    /// disposition still marks a body part.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        if self.is_multipart() {
            return false;
        }
        self.disposition()
            .is_some_and(|cd| cd.kind == DispositionType::Attachment)
            || self.filename().is_some()
            || self.content_id().is_some()
    }

    /// Checks if this part is rendered inline.
    ///
    /// An `attachment` disposition always wins; otherwise an `inline`
    /// disposition or a content-id marks the part inline.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        match self.disposition() {
            Some(cd) if cd.kind == DispositionType::Attachment => false,
            Some(cd) if cd.is_inline() => true,
            _ => self.content_id().is_some(),
        }
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        self.transfer_encoding().decode(&self.body)
    }

    fn find_body(&self, mime_type: &str) -> Option<&Self> {
        if self.parts.is_empty() {
            let matches = !self.is_attachment()
                && self.content_type().is_ok_and(|ct| ct.is(mime_type));
            return matches.then_some(self);
        }
        self.parts.iter().find_map(|part| part.find_body(mime_type))
    }

    fn collect_attachments<'a>(&'a self, out: &mut Vec<&'a Self>) {
        if self.parts.is_empty() {
            if self.is_attachment() {
                out.push(self);
            }
            return;
        }
        for part in &self.parts {
            part.collect_attachments(out);
        }
    }
}

/// MIME message.
#[derive(Debug, Clone, Default)]
pub struct Message {
    /// Message headers.
    pub headers: Headers,
    /// Message parts (empty for single-part messages).
    pub parts: Vec<Part>,
    /// Body for single-part messages.
    pub body: Option<Vec<u8>>,
}

impl Message {
    /// Creates a new message.
    #[must_use]
    pub const fn new(headers: Headers) -> Self {
        Self {
            headers,
            parts: Vec::new(),
            body: None,
        }
    }

    /// Creates a single-part message.
    #[must_use]
    pub const fn single_part(headers: Headers, body: Vec<u8>) -> Self {
        Self {
            headers,
            parts: Vec::new(),
            body: Some(body),
        }
    }

    /// Creates a multipart message.
    #[must_use]
    pub const fn multipart(headers: Headers, parts: Vec<Part>) -> Self {
        Self {
            headers,
            parts,
            body: None,
        }
    }

    /// Parses a raw RFC 5322 message, splitting MIME multiparts.
    ///
    /// # Errors
    ///
    /// Returns an error if the headers are malformed or a multipart body
    /// has no boundary or no parts.
    pub fn parse(raw: &str) -> Result<Self> {
        let root = Part::parse(raw)?;
        if root.parts.is_empty() {
            Ok(Self::single_part(root.headers, root.body))
        } else {
            Ok(Self::multipart(root.headers, root.parts))
        }
    }

    /// Looks up a header field by name (case-insensitive, first match).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&HeaderField> {
        self.headers.get(name)
    }

    /// Returns all header fields in declaration order.
    pub fn header_fields(&self) -> impl Iterator<Item = &HeaderField> {
        self.headers.iter()
    }

    /// Gets the content type, defaulting to `text/plain`.
    ///
    /// # Errors
    ///
    /// Returns an error if content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        content_type_of(&self.headers)
    }

    /// Gets the bare `type/subtype`, or `None` when the header is invalid.
    #[must_use]
    pub fn mime_type(&self) -> Option<String> {
        self.content_type().ok().map(|ct| ct.mime_type())
    }

    /// Gets the declared `charset` of a `text/*` single-part body.
    #[must_use]
    pub fn charset(&self) -> Option<String> {
        charset_of(&self.headers)
    }

    /// Checks if this is a multipart message.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        !self.parts.is_empty()
    }

    /// Parses an address-list header; `None` when the header is absent.
    #[must_use]
    pub fn addresses(&self, name: &str) -> Option<Vec<Mailbox>> {
        self.headers
            .get_text(name)
            .map(|value| Mailbox::parse_list(&value))
    }

    /// Gets the From mailboxes.
    #[must_use]
    pub fn from(&self) -> Option<Vec<Mailbox>> {
        self.addresses("from")
    }

    /// Gets the To mailboxes.
    #[must_use]
    pub fn to(&self) -> Option<Vec<Mailbox>> {
        self.addresses("to")
    }

    /// Gets the Cc mailboxes.
    #[must_use]
    pub fn cc(&self) -> Option<Vec<Mailbox>> {
        self.addresses("cc")
    }

    /// Gets the Bcc mailboxes.
    #[must_use]
    pub fn bcc(&self) -> Option<Vec<Mailbox>> {
        self.addresses("bcc")
    }

    /// Gets the Subject with encoded-words decoded.
    #[must_use]
    pub fn subject(&self) -> Option<String> {
        self.headers
            .get_text("subject")
            .map(|subject| decode_encoded_words(&subject))
    }

    /// Decodes the single-part body; `None` for multipart messages.
    ///
    /// # Errors
    ///
    /// Returns an error if transfer decoding fails.
    pub fn decoded_body(&self) -> Result<Option<Vec<u8>>> {
        let Some(body) = self.body.as_ref() else {
            return Ok(None);
        };
        let encoding = self
            .headers
            .get_text("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, |enc| TransferEncoding::parse(&enc));
        encoding.decode(body).map(Some)
    }

    /// Finds the first text/plain body part in a multipart message.
    #[must_use]
    pub fn text_part(&self) -> Option<&Part> {
        self.parts.iter().find_map(|part| part.find_body("text/plain"))
    }

    /// Finds the first text/html body part in a multipart message.
    #[must_use]
    pub fn html_part(&self) -> Option<&Part> {
        self.parts.iter().find_map(|part| part.find_body("text/html"))
    }

    /// Returns every attachment part, depth-first in declaration order.
    #[must_use]
    pub fn attachments(&self) -> Vec<&Part> {
        let mut attachments = Vec::new();
        for part in &self.parts {
            part.collect_attachments(&mut attachments);
        }
        attachments
    }
}

fn content_type_of(headers: &Headers) -> Result<ContentType> {
    headers
        .get_text("content-type")
        .map_or_else(|| Ok(ContentType::text_plain()), |ct| ContentType::parse(&ct))
}

fn charset_of(headers: &Headers) -> Option<String> {
    content_type_of(headers)
        .ok()
        .filter(ContentType::is_text)
        .and_then(|ct| ct.charset().map(str::to_string))
}

/// Splits raw text at the first blank line.
fn split_header_body(raw: &str) -> (&str, &str) {
    if raw.starts_with("\r\n") {
        return ("", &raw[2..]);
    }
    if raw.starts_with('\n') {
        return ("", &raw[1..]);
    }

    let crlf = raw.find("\r\n\r\n").map(|i| (i, 4));
    let lf = raw.find("\n\n").map(|i| (i, 2));
    let split = match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 < b.0 { a } else { b }),
        (a, b) => a.or(b),
    };

    match split {
        Some((at, len)) => (&raw[..at], &raw[at + len..]),
        None => (raw, ""),
    }
}

/// Splits a multipart body on its boundary delimiter lines.
fn split_multipart(body: &str, boundary: &str) -> Result<Vec<Part>> {
    let delimiter = format!("--{boundary}");
    let mut sections = body.split(delimiter.as_str());
    // Preamble
    sections.next();

    let mut parts = Vec::new();
    for section in sections {
        if section.starts_with("--") {
            break;
        }
        let section = section
            .strip_prefix("\r\n")
            .or_else(|| section.strip_prefix('\n'))
            .unwrap_or(section);
        let section = section
            .strip_suffix("\r\n")
            .or_else(|| section.strip_suffix('\n'))
            .unwrap_or(section);
        parts.push(Part::parse(section)?);
    }

    if parts.is_empty() {
        return Err(Error::InvalidMultipart(format!(
            "no parts delimited by {delimiter:?}"
        )));
    }
    Ok(parts)
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

    const MIXED: &str = concat!(
        "From: Sender <sender@example.com>\r\n",
        "To: a@example.com, \"B, Bee\" <b@example.com>\r\n",
        "Subject: =?utf-8?B?SMOpbGxv?=\r\n",
        "Content-Type: multipart/mixed; boundary=\"outer\"\r\n",
        "\r\n",
        "preamble\r\n",
        "--outer\r\n",
        "Content-Type: multipart/alternative; boundary=inner\r\n",
        "\r\n",
        "--inner\r\n",
        "Content-Type: text/plain; charset=utf-8\r\n",
        "Content-Transfer-Encoding: quoted-printable\r\n",
        "\r\n",
        "Caf=C3=A9\r\n",
        "--inner\r\n",
        "Content-Type: text/html\r\n",
        "\r\n",
        "<p>Hi</p>\r\n",
        "--inner--\r\n",
        "--outer\r\n",
        "Content-Type: application/pdf; name=\"report.pdf\"\r\n",
        "Content-Disposition: attachment; filename=\"report.pdf\"\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "\r\n",
        "JVBERi0=\r\n",
        "--outer\r\n",
        "Content-Type: image/png\r\n",
        "Content-ID: <logo@example>\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "\r\n",
        "iVBORw==\r\n",
        "--outer--\r\n",
    );

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse(" BASE64 "), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("quoted-printable"),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(TransferEncoding::Base64.to_string(), "base64");
    }

    #[test]
    fn test_message_single_part() {
        let message = Message::parse(concat!(
            "From: sender@example.com\r\n",
            "Subject: Test\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<b>Hello</b>"
        ))
        .unwrap();

        assert!(!message.is_multipart());
        assert_eq!(message.mime_type().as_deref(), Some("text/html"));
        assert_eq!(message.subject().as_deref(), Some("Test"));
        assert_eq!(message.decoded_body().unwrap().unwrap(), b"<b>Hello</b>");
        assert!(message.html_part().is_none());
    }

    #[test]
    fn test_message_without_headers() {
        let message = Message::parse("\r\nbody only").unwrap();
        assert!(message.headers.is_empty());
        assert_eq!(message.body.as_deref(), Some(&b"body only"[..]));
        assert_eq!(message.mime_type().as_deref(), Some("text/plain"));
    }

    #[test]
    fn test_message_multipart_structure() {
        let message = Message::parse(MIXED).unwrap();

        assert!(message.is_multipart());
        assert_eq!(message.parts.len(), 3);
        assert_eq!(message.subject().as_deref(), Some("Héllo"));

        let to = message.to().unwrap();
        assert_eq!(to.len(), 2);
        assert_eq!(to[1].name, "B, Bee");
        assert!(message.cc().is_none());

        let text = message.text_part().unwrap();
        assert_eq!(text.decode_body().unwrap(), "Café".as_bytes());
        let html = message.html_part().unwrap();
        assert_eq!(html.decode_body().unwrap(), b"<p>Hi</p>");
    }

    #[test]
    fn test_message_attachments() {
        let message = Message::parse(MIXED).unwrap();
        let attachments = message.attachments();
        assert_eq!(attachments.len(), 2);

        let report = attachments[0];
        assert_eq!(report.filename().as_deref(), Some("report.pdf"));
        assert_eq!(report.mime_type().as_deref(), Some("application/pdf"));
        assert!(!report.is_inline());
        assert_eq!(report.decode_body().unwrap(), b"%PDF-");

        let logo = attachments[1];
        assert_eq!(logo.content_id().as_deref(), Some("logo@example"));
        assert!(logo.is_inline());
        assert!(logo.filename().is_none());
    }

    #[test]
    fn test_multipart_without_boundary() {
        let raw = "Content-Type: multipart/mixed\r\n\r\nbody";
        assert!(matches!(Message::parse(raw), Err(Error::MissingBoundary)));
    }

    #[test]
    fn test_multipart_without_parts() {
        let raw = "Content-Type: multipart/mixed; boundary=x\r\n\r\nno delimiters";
        assert!(matches!(Message::parse(raw), Err(Error::InvalidMultipart(_))));
    }

    #[test]
    fn test_body_part_is_not_attachment() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        let part = Part::new(headers, b"Hello".to_vec());
        assert!(!part.is_attachment());
        assert!(!part.is_inline());
    }

    #[test]
    fn test_attachment_disposition_beats_content_id() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "application/pdf");
        headers.add("Content-Disposition", "attachment; filename=\"terms.pdf\"");
        headers.add("Content-ID", "<abc@mail>");
        let part = Part::new(headers, b"%PDF-".to_vec());
        assert!(part.is_attachment());
        assert!(!part.is_inline());

        let mut headers = Headers::new();
        headers.add("Content-Type", "image/png");
        headers.add("Content-ID", "<logo@mail>");
        assert!(Part::new(headers, Vec::new()).is_inline());
    }

    #[test]
    fn test_charset_only_for_text_parts() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain; charset=ISO-8859-1");
        assert_eq!(Part::new(headers, Vec::new()).charset().as_deref(), Some("ISO-8859-1"));

        let mut headers = Headers::new();
        headers.add("Content-Type", "application/json; charset=utf-8");
        assert!(Part::new(headers, Vec::new()).charset().is_none());

        let raw = "Content-Type: text/html; charset=\"windows-1252\"\r\n\r\n<p>x</p>";
        assert_eq!(Message::parse(raw).unwrap().charset().as_deref(), Some("windows-1252"));
    }

    #[test]
    fn test_latin1_headers_are_decoded() {
        let raw = concat!(
            "From: =?ISO-8859-1?Q?Ren=E9?= <r@x.com>\r\n",
            "Subject: =?ISO-8859-1?Q?caf=E9?=\r\n",
            "\r\n",
            "body",
        );
        let message = Message::parse(raw).unwrap();
        assert_eq!(message.subject().as_deref(), Some("café"));
        assert_eq!(message.from().unwrap()[0].name, "René");
    }

    #[test]
    fn test_inline_body_part_is_not_attachment() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/html");
        headers.add("Content-Disposition", "inline");
        let message = Message::multipart(Headers::new(), vec![Part::new(headers, b"<p>x</p>".to_vec())]);
        assert!(message.attachments().is_empty());
        assert!(message.html_part().is_some());
    }
}
