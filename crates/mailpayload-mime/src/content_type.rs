//! `Content-Type` and `Content-Disposition` header values.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;

/// MIME content type with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "text", "image", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "html", "jpeg").
    pub sub_type: String,
    /// Parameters (e.g., charset=utf-8, boundary=xxx).
    pub parameters: HashMap<String, String>,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: HashMap::new(),
        }
    }

    /// The RFC 2045 default for parts without a `Content-Type` header.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain").with_parameter("charset", "us-ascii")
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Returns the bare `type/subtype` without parameters.
    #[must_use]
    pub fn mime_type(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Checks the bare `type/subtype` against `mime_type` (case-insensitive).
    #[must_use]
    pub fn is(&self, mime_type: &str) -> bool {
        mime_type.split_once('/').is_some_and(|(main, sub)| {
            self.main_type.eq_ignore_ascii_case(main) && self.sub_type.eq_ignore_ascii_case(sub)
        })
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameters.get("charset").map(String::as_str)
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameters.get("boundary").map(String::as_str)
    }

    /// Returns the `name` parameter (legacy attachment filename) if present.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.parameters.get("name").map(String::as_str)
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("multipart")
    }

    /// Checks if this is a text content type.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("text")
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2="value 2"`
    ///
    /// # Errors
    ///
    /// Returns an error if the type or subtype is missing.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = split_parameters(s).into_iter();

        let type_str = parts
            .next()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::InvalidContentType("Empty content type".to_string()))?;

        let (main_type, sub_type) = type_str
            .split_once('/')
            .map(|(main, sub)| (main.trim().to_lowercase(), sub.trim().to_lowercase()))
            .filter(|(main, sub)| !main.is_empty() && !sub.is_empty())
            .ok_or_else(|| Error::InvalidContentType(format!("Missing subtype in {type_str:?}")))?;

        let mut content_type = Self::new(main_type, sub_type);
        content_type.parameters = parse_parameters(parts);
        Ok(content_type)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let main = &self.main_type;
        let sub = &self.sub_type;
        write!(f, "{main}/{sub}")?;

        let mut params: Vec<_> = self.parameters.iter().collect();
        params.sort();
        for (key, value) in params {
            // Quote value if it contains special characters
            if value.contains(|c: char| c.is_whitespace() || "()<>@,;:\\\"/[]?=".contains(c)) {
                write!(f, "; {key}=\"{value}\"")?;
            } else {
                write!(f, "; {key}={value}")?;
            }
        }

        Ok(())
    }
}

/// Disposition type of a MIME part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispositionType {
    /// Rendered inline with the message body.
    Inline,
    /// Offered as a downloadable file.
    Attachment,
    /// Any other token (treated like `attachment` by RFC 2183).
    Other,
}

/// Parsed `Content-Disposition` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    /// Disposition type.
    pub kind: DispositionType,
    /// Parameters (e.g., filename, size).
    pub parameters: HashMap<String, String>,
}

impl ContentDisposition {
    /// Parses a content disposition string.
    ///
    /// Format: `attachment; filename="report.pdf"`. This never fails: an
    /// unknown disposition token becomes [`DispositionType::Other`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let mut parts = split_parameters(s).into_iter();
        let kind = match parts.next().map(|t| t.to_ascii_lowercase()).as_deref() {
            Some("inline") => DispositionType::Inline,
            Some("attachment") => DispositionType::Attachment,
            _ => DispositionType::Other,
        };

        Self {
            kind,
            parameters: parse_parameters(parts),
        }
    }

    /// Returns the filename parameter if present.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.parameters.get("filename").map(String::as_str)
    }

    /// Checks if the disposition is `inline`.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        self.kind == DispositionType::Inline
    }
}

/// Splits a header value on `;`, honouring double-quoted strings.
fn split_parameters(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in s.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            ';' if !in_quotes => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    parts.push(current.trim().to_string());
    parts
}

fn parse_parameters(params: impl Iterator<Item = String>) -> HashMap<String, String> {
    params
        .filter_map(|param| {
            let (key, value) = param.split_once('=')?;
            let key = key.trim().to_lowercase();
            let value = value.trim().trim_matches('"').to_string();
            Some((key, value))
        })
        .collect()
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

    #[test]
    fn test_content_type_parse() {
        let ct = ContentType::parse("text/plain; charset=utf-8").unwrap();
        assert_eq!(ct.main_type, "text");
        assert_eq!(ct.sub_type, "plain");
        assert_eq!(ct.charset(), Some("utf-8"));
        assert_eq!(ct.mime_type(), "text/plain");
    }

    #[test]
    fn test_content_type_parse_quoted() {
        let ct = ContentType::parse("multipart/mixed; boundary=\"----=_Part;123\"").unwrap();
        assert!(ct.is_multipart());
        assert_eq!(ct.boundary(), Some("----=_Part;123"));
    }

    #[test]
    fn test_content_type_is_case_insensitive() {
        let ct = ContentType::parse("Text/HTML").unwrap();
        assert!(ct.is("text/html"));
        assert!(!ct.is("text/plain"));
    }

    #[test]
    fn test_content_type_parse_missing_subtype() {
        assert!(ContentType::parse("text").is_err());
        assert!(ContentType::parse("").is_err());
    }

    #[test]
    fn test_content_type_display() {
        let ct = ContentType::new("image", "png").with_parameter("name", "logo 1.png");
        assert_eq!(ct.to_string(), "image/png; name=\"logo 1.png\"");
    }

    #[test]
    fn test_disposition_parse() {
        let cd = ContentDisposition::parse("attachment; filename=\"report.pdf\"");
        assert_eq!(cd.kind, DispositionType::Attachment);
        assert_eq!(cd.filename(), Some("report.pdf"));
        assert!(!cd.is_inline());

        let cd = ContentDisposition::parse("INLINE");
        assert!(cd.is_inline());
        assert_eq!(cd.filename(), None);
    }

    #[test]
    fn test_disposition_unknown_token() {
        let cd = ContentDisposition::parse("form-data; name=field");
        assert_eq!(cd.kind, DispositionType::Other);
    }
}
