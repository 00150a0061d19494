//! MIME header handling.
//!
//! Headers keep their declaration order and the case of their names. Every
//! field stores the value exactly as it was supplied (a [`FieldValue`]) and
//! renders a display form on demand, so callers can choose between the
//! interpreted text and the verbatim original.

use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde_json::Value;
use std::fmt;

/// Column at which structured values are folded when rendered.
const FOLD_WIDTH: usize = 78;

/// Value of a header field as supplied by whoever built the message.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Plain text. For parsed messages this is the raw, still-folded text.
    Text(String),
    /// Structured data such as merge variable lists or metadata maps.
    Structured(Value),
    /// A point in time with a UTC offset.
    DateTime(DateTime<FixedOffset>),
    /// A calendar date without a time of day.
    Date(NaiveDate),
}

impl FieldValue {
    /// Returns the value when it is a plain string, either as text or as a
    /// structured JSON string.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) | Self::Structured(Value::String(text)) => Some(text),
            _ => None,
        }
    }

    /// Short name of the variant, for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Structured(_) => "structured",
            Self::DateTime(_) => "date-time",
            Self::Date(_) => "date",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        Self::Structured(value)
    }
}

impl From<DateTime<FixedOffset>> for FieldValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::DateTime(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value.fixed_offset())
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

/// A single header field.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderField {
    name: String,
    value: FieldValue,
}

impl HeaderField {
    /// Creates a header field.
    pub fn new(name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Header name, with the case it was declared with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value exactly as supplied, before any rendering.
    #[must_use]
    pub const fn original_value(&self) -> &FieldValue {
        &self.value
    }

    /// The display rendering of the value.
    ///
    /// Text is unfolded and trimmed. Arrays of scalars are joined with
    /// `", "`; other structured values become compact JSON folded at 78
    /// columns. Date-times use RFC 2822 and dates `YYYY-MM-DD`.
    #[must_use]
    pub fn formatted_value(&self) -> String {
        match &self.value {
            FieldValue::Text(text) => text.replace(['\r', '\n'], "").trim().to_string(),
            FieldValue::Structured(value) => render_structured(value),
            FieldValue::DateTime(at) => at.to_rfc2822(),
            FieldValue::Date(date) => date.format("%Y-%m-%d").to_string(),
        }
    }
}

fn render_structured(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) if items.iter().all(is_scalar) => items
            .iter()
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join(", "),
        other => fold_json(&other.to_string()),
    }
}

const fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Folds compact JSON after commas that sit outside string literals.
fn fold_json(json: &str) -> String {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in json.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
        } else if ch == '"' {
            in_string = true;
        } else if ch == ',' {
            segments.push(&json[start..=i]);
            start = i + 1;
        }
    }
    segments.push(&json[start..]);

    let mut folded = String::with_capacity(json.len());
    let mut line_len = 0;
    for segment in segments {
        if line_len > 0 && line_len + segment.len() > FOLD_WIDTH {
            folded.push_str("\r\n ");
            line_len = 1;
        }
        folded.push_str(segment);
        line_len += segment.len();
    }
    folded
}

/// Ordered collection of email headers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Headers {
    fields: Vec<HeaderField>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header field.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.push(HeaderField::new(name, value));
    }

    /// Sets a header value, replacing any existing fields of that name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        self.remove(&name);
        self.add(name, value);
    }

    /// Gets the first field with this name (case-insensitive).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&HeaderField> {
        self.fields
            .iter()
            .find(|field| field.name.eq_ignore_ascii_case(name))
    }

    /// Gets the formatted value of the first field with this name.
    #[must_use]
    pub fn get_text(&self, name: &str) -> Option<String> {
        self.get(name).map(HeaderField::formatted_value)
    }

    /// Gets all fields with this name, in declaration order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&HeaderField> {
        self.fields
            .iter()
            .filter(|field| field.name.eq_ignore_ascii_case(name))
            .collect()
    }

    /// Checks whether a field with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes all fields with this name.
    pub fn remove(&mut self, name: &str) {
        self.fields
            .retain(|field| !field.name.eq_ignore_ascii_case(name));
    }

    /// Returns an iterator over all fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &HeaderField> {
        self.fields.iter()
    }

    /// Number of fields, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Checks whether there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parses headers from raw text.
    ///
    /// Headers are in the format:
    /// ```text
    /// Header-Name: value
    ///   continuation
    /// ```
    ///
    /// Values are kept verbatim: continuation lines stay attached with their
    /// `\r\n` and leading whitespace, so [`HeaderField::original_value`]
    /// returns the folded text and [`HeaderField::formatted_value`] the
    /// unfolded one.
    ///
    /// # Errors
    ///
    /// Returns an error if a line is neither a field nor a continuation.
    pub fn parse(text: &str) -> Result<Self> {
        let mut headers = Self::new();
        let mut current: Option<(String, String)> = None;

        for line in text.lines() {
            if line.is_empty() {
                break;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some((_, value)) = current.as_mut() {
                    value.push_str("\r\n");
                    value.push_str(line);
                }
                continue;
            }

            if let Some((name, value)) = current.take() {
                headers.add(name, value);
            }

            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| Error::InvalidHeader(line.to_string()))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::InvalidHeader(line.to_string()));
            }
            current = Some((name.to_string(), value.trim().to_string()));
        }

        if let Some((name, value)) = current {
            headers.add(name, value);
        }

        Ok(headers)
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a HeaderField;
    type IntoIter = std::slice::Iter<'a, HeaderField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.fields {
            writeln!(f, "{}: {}", field.name, field.formatted_value())?;
        }
        Ok(())
    }
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
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_field_value_as_text() {
        assert_eq!(FieldValue::from("plain").as_text(), Some("plain"));
        assert_eq!(FieldValue::from(json!("quoted")).as_text(), Some("quoted"));
        assert_eq!(FieldValue::from(json!(["a"])).as_text(), None);
        let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(FieldValue::from(date).as_text(), None);
    }

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get_text("Content-Type").as_deref(), Some("text/plain"));
        assert_eq!(headers.get_text("content-type").as_deref(), Some("text/plain")); // Case insensitive
        assert_eq!(headers.get("content-type").unwrap().name(), "Content-Type");
    }

    #[test]
    fn test_headers_keep_order_and_duplicates() {
        let mut headers = Headers::new();
        headers.add("X-Foo", "1");
        headers.add("Subject", "Hi");
        headers.add("X-Foo", "2");

        let names: Vec<_> = headers.iter().map(HeaderField::name).collect();
        assert_eq!(names, ["X-Foo", "Subject", "X-Foo"]);
        assert_eq!(headers.get_all("x-foo").len(), 2);
        assert_eq!(headers.get_text("X-Foo").as_deref(), Some("1"));
    }

    #[test]
    fn test_headers_set_and_remove() {
        let mut headers = Headers::new();
        headers.add("To", "alice@example.com");
        headers.add("To", "bob@example.com");

        headers.set("To", "charlie@example.com");
        assert_eq!(headers.get_all("To").len(), 1);
        assert_eq!(headers.get_text("To").as_deref(), Some("charlie@example.com"));

        headers.remove("to");
        assert!(!headers.contains("To"));
        assert!(headers.is_empty());
    }

    #[test]
    fn test_headers_parse_keeps_folding_in_original() {
        let text = concat!(
            "From: sender@example.com\r\n",
            "Subject: Test Message\r\n",
            "Content-Type: text/plain;\r\n",
            " charset=utf-8\r\n",
            "\r\n",
            "Body: not a header\r\n"
        );

        let headers = Headers::parse(text).unwrap();
        assert_eq!(headers.len(), 3);
        let content_type = headers.get("Content-Type").unwrap();
        assert_eq!(
            content_type.original_value(),
            &FieldValue::Text("text/plain;\r\n charset=utf-8".to_string())
        );
        assert_eq!(content_type.formatted_value(), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_headers_parse_rejects_garbage_line() {
        assert!(Headers::parse("Subject: ok\r\nthis is not a header\r\n").is_err());
        assert!(Headers::parse(": no name\r\n").is_err());
    }

    #[test]
    fn test_formatted_scalar_array_is_comma_joined() {
        let field = HeaderField::new("tags", json!(["welcome", "onboarding", 3]));
        assert_eq!(field.formatted_value(), "welcome, onboarding, 3");
        assert_eq!(
            field.original_value(),
            &FieldValue::Structured(json!(["welcome", "onboarding", 3]))
        );
    }

    #[test]
    fn test_formatted_structured_is_folded_json() {
        let value = json!([
            {"name": "FIRST_NAME", "content": "Jane"},
            {"name": "LAST_NAME", "content": "Doe"},
            {"name": "COMPANY", "content": "Example, Inc."}
        ]);
        let field = HeaderField::new("global_merge_vars", value.clone());
        let formatted = field.formatted_value();

        assert!(formatted.contains("\r\n "));
        assert!(formatted.contains("Example, Inc."));
        let unfolded = formatted.replace(['\r', '\n'], "");
        assert_eq!(serde_json::from_str::<Value>(&unfolded).unwrap(), value);
    }

    #[test]
    fn test_formatted_dates() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 13, 5, 9).unwrap();
        let field = HeaderField::new("send_at", at);
        assert_eq!(field.formatted_value(), "Fri, 1 Mar 2024 13:05:09 +0000");

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let field = HeaderField::new("send_at", date);
        assert_eq!(field.formatted_value(), "2024-03-01");
        assert_eq!(field.original_value().kind(), "date");
    }

    #[test]
    fn test_headers_display() {
        let mut headers = Headers::new();
        headers.add("From", "sender@example.com");
        headers.add("X-Tags", json!(["a", "b"]));

        assert_eq!(headers.to_string(), "From: sender@example.com\nX-Tags: a, b\n");
    }
}
