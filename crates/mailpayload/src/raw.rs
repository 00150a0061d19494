//! Verbatim reads of structured extension headers.
//!
//! Structured fields are read through [`HeaderField::original_value`] so the
//! host's display rendering (folding, list joining) never reaches the
//! payload. `global_merge_vars` may still arrive as text, typically from a
//! parsed message; that text is parsed as JSON after removing CR and LF
//! characters and is never interpreted any other way.
//!
//! [`HeaderField::original_value`]: mailpayload_mime::HeaderField::original_value

use crate::error::{Error, Result};
use crate::field::{ExtensionField, FieldReader};
use mailpayload_mime::{FieldValue, Message};
use serde_json::Value;

/// Returns the original value of an extension header, if present.
#[must_use]
pub fn original(message: &Message, field: ExtensionField) -> Option<&FieldValue> {
    debug_assert_eq!(field.reader(), FieldReader::Raw);
    let value = message.header(field.header_name())?.original_value();
    tracing::trace!(field = field.header_name(), kind = value.kind(), "Read raw extension value");
    Some(value)
}

/// Returns the original value of an extension header as JSON.
///
/// # Errors
///
/// Returns [`Error::MalformedMergeVarsJson`] if `global_merge_vars` is text
/// that does not parse as JSON.
pub fn json_value(message: &Message, field: ExtensionField) -> Result<Option<Value>> {
    let Some(value) = original(message, field) else {
        return Ok(None);
    };

    match value.as_text() {
        Some(text) if field == ExtensionField::GlobalMergeVars => parse_json_text(text).map(Some),
        _ => Ok(Some(to_json(value))),
    }
}

/// Parses JSON text after stripping every `\r` and `\n`.
///
/// # Errors
///
/// Returns [`Error::MalformedMergeVarsJson`] if the cleaned text is not JSON.
pub fn parse_json_text(text: &str) -> Result<Value> {
    let cleaned: String = text.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
    serde_json::from_str(&cleaned).map_err(Error::MalformedMergeVarsJson)
}

fn to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(text) => Value::String(text.clone()),
        FieldValue::Structured(value) => value.clone(),
        FieldValue::DateTime(at) => Value::String(at.to_rfc3339()),
        FieldValue::Date(date) => Value::String(date.format("%Y-%m-%d").to_string()),
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
    use chrono::NaiveDate;
    use mailpayload_mime::Headers;
    use serde_json::json;

    fn message_with(name: &str, value: impl Into<FieldValue>) -> Message {
        let mut headers = Headers::new();
        headers.add(name, value);
        Message::single_part(headers, Vec::new())
    }

    #[test]
    fn test_absent_field() {
        let message = Message::single_part(Headers::new(), Vec::new());
        assert!(json_value(&message, ExtensionField::Metadata).unwrap().is_none());
        assert!(original(&message, ExtensionField::SendAt).is_none());
    }

    #[test]
    fn test_structured_value_bypasses_formatting() {
        let vars = json!([
            {"rcpt": "a@x.com", "vars": [{"name": "FNAME", "content": "Alice"}]},
            {"rcpt": "b@x.com", "vars": [{"name": "FNAME", "content": "Bob, Jr."}]}
        ]);
        let message = message_with("merge_vars", vars.clone());

        assert!(message.header("merge_vars").unwrap().formatted_value().contains("\r\n "));
        assert_eq!(json_value(&message, ExtensionField::MergeVars).unwrap(), Some(vars));
    }

    #[test]
    fn test_global_merge_vars_text_is_parsed() {
        let message = message_with(
            "global_merge_vars",
            "[{\"name\":\"FOO\",\"content\":\"bar\"}]\r\n",
        );
        assert_eq!(
            json_value(&message, ExtensionField::GlobalMergeVars).unwrap(),
            Some(json!([{"name": "FOO", "content": "bar"}]))
        );
    }

    #[test]
    fn test_global_merge_vars_json_string_is_parsed() {
        let message = message_with(
            "global_merge_vars",
            json!("[{\"name\":\"FOO\",\"content\":\"bar\"}]\r\n"),
        );
        assert_eq!(
            json_value(&message, ExtensionField::GlobalMergeVars).unwrap(),
            Some(json!([{"name": "FOO", "content": "bar"}]))
        );

        let message = message_with("global_merge_vars", json!("not json"));
        assert!(matches!(
            json_value(&message, ExtensionField::GlobalMergeVars),
            Err(Error::MalformedMergeVarsJson(_))
        ));
    }

    #[test]
    fn test_global_merge_vars_folded_text_is_parsed() {
        let message = message_with(
            "global_merge_vars",
            "[{\"name\":\"A\",\"content\":\"1\"},\r\n {\"name\":\"B\",\"content\":\"2\"}]",
        );
        let value = json_value(&message, ExtensionField::GlobalMergeVars).unwrap().unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_global_merge_vars_garbage_fails() {
        let message = message_with("global_merge_vars", "[{name: 'FOO'}]; system('ls')");
        assert!(matches!(
            json_value(&message, ExtensionField::GlobalMergeVars),
            Err(Error::MalformedMergeVarsJson(_))
        ));
    }

    #[test]
    fn test_other_text_fields_stay_strings() {
        let message = message_with("metadata", "{\"website\":\"x.com\"}");
        assert_eq!(
            json_value(&message, ExtensionField::Metadata).unwrap(),
            Some(json!("{\"website\":\"x.com\"}"))
        );
    }

    #[test]
    fn test_dates_become_strings() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let message = message_with("template_content", date);
        assert_eq!(
            json_value(&message, ExtensionField::TemplateContent).unwrap(),
            Some(json!("2024-03-01"))
        );
    }
}
