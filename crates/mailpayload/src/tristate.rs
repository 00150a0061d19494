//! Boolean-like extension headers.

use crate::field::{ExtensionField, FieldReader};
use mailpayload_mime::Message;
use serde::{Serialize, Serializer};

/// Literal that reads as `true`; anything else present reads as `false`.
const TRUE_TOKEN: &str = "true";

/// An optional boolean: unset, true or false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriState {
    /// The header is not on the message. Serializes as `null`.
    #[default]
    Absent,
    /// The header reads exactly `true`.
    True,
    /// The header is present with any other text.
    False,
}

impl TriState {
    /// Interprets an optional header text.
    #[must_use]
    pub fn from_text(text: Option<&str>) -> Self {
        match text {
            None => Self::Absent,
            Some(TRUE_TOKEN) => Self::True,
            Some(_) => Self::False,
        }
    }

    /// Converts to `Option<bool>`.
    #[must_use]
    pub const fn as_option(self) -> Option<bool> {
        match self {
            Self::Absent => None,
            Self::True => Some(true),
            Self::False => Some(false),
        }
    }
}

impl Serialize for TriState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_option().serialize(serializer)
    }
}

/// Reads a tri-state extension header.
#[must_use]
pub fn read(message: &Message, field: ExtensionField) -> TriState {
    debug_assert_eq!(field.reader(), FieldReader::TriState);
    let text = message.header(field.header_name()).map(|h| h.formatted_value());
    TriState::from_text(text.as_deref())
}

/// Reads a two-valued flag: `true` only for the exact text `true`.
///
/// Unlike [`read`], an absent header is plain `false`.
#[must_use]
pub fn read_flag(message: &Message, field: ExtensionField) -> bool {
    debug_assert_eq!(field.reader(), FieldReader::Flag);
    message
        .header(field.header_name())
        .is_some_and(|h| h.formatted_value() == TRUE_TOKEN)
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
    use mailpayload_mime::{FieldValue, Headers};
    use proptest::prelude::*;
    use serde_json::json;

    fn message_with(name: &str, value: impl Into<FieldValue>) -> Message {
        let mut headers = Headers::new();
        headers.add(name, value);
        Message::single_part(headers, Vec::new())
    }

    #[test]
    fn test_from_text() {
        assert_eq!(TriState::from_text(None), TriState::Absent);
        assert_eq!(TriState::from_text(Some("true")), TriState::True);
        assert_eq!(TriState::from_text(Some("false")), TriState::False);
        assert_eq!(TriState::from_text(Some("")), TriState::False);
        assert_eq!(TriState::from_text(Some("True")), TriState::False);
    }

    #[test]
    fn test_serializes_as_nullable_bool() {
        assert_eq!(serde_json::to_value(TriState::Absent).unwrap(), json!(null));
        assert_eq!(serde_json::to_value(TriState::True).unwrap(), json!(true));
        assert_eq!(serde_json::to_value(TriState::False).unwrap(), json!(false));
    }

    #[test]
    fn test_read_header() {
        let message = message_with("Track_Opens", "true");
        assert_eq!(read(&message, ExtensionField::TrackOpens), TriState::True);
        assert_eq!(read(&message, ExtensionField::TrackClicks), TriState::Absent);
    }

    #[test]
    fn test_read_structured_boolean() {
        let message = message_with("inline_css", json!(true));
        assert_eq!(read(&message, ExtensionField::InlineCss), TriState::True);
    }

    #[test]
    fn test_flag_is_two_valued() {
        let empty = Message::single_part(Headers::new(), Vec::new());
        assert!(!read_flag(&empty, ExtensionField::Important));
        assert!(read_flag(&message_with("important", "true"), ExtensionField::Important));
        assert!(!read_flag(&message_with("important", "TRUE"), ExtensionField::Important));
        assert!(!read_flag(&message_with("important", "1"), ExtensionField::Important));
    }

    proptest! {
        #[test]
        fn prop_only_exact_true_is_true(text in "\\PC*") {
            let expected = if text == "true" { TriState::True } else { TriState::False };
            prop_assert_eq!(TriState::from_text(Some(text.as_str())), expected);
        }
    }
}
