//! Tag list parsing.

use crate::field::{ExtensionField, FieldReader};
use mailpayload_mime::Message;

const SEPARATOR: &str = ", ";

/// Splits a tag header value on `", "`.
///
/// An absent or empty value yields no tags; trailing empty tokens are
/// dropped.
#[must_use]
pub fn parse(value: Option<&str>) -> Vec<String> {
    let mut tags: Vec<String> = value
        .unwrap_or_default()
        .split(SEPARATOR)
        .map(str::to_string)
        .collect();
    while tags.last().is_some_and(String::is_empty) {
        tags.pop();
    }
    tags
}

/// Reads the `tags` extension header.
#[must_use]
pub fn read(message: &Message) -> Vec<String> {
    debug_assert_eq!(ExtensionField::Tags.reader(), FieldReader::List);
    let value = message.headers.get_text(ExtensionField::Tags.header_name());
    parse(value.as_deref())
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
    use mailpayload_mime::Headers;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_absent_is_empty() {
        assert!(parse(None).is_empty());
        assert!(parse(Some("")).is_empty());
    }

    #[test]
    fn test_split_on_comma_space_only() {
        assert_eq!(parse(Some("welcome, onboarding")), ["welcome", "onboarding"]);
        assert_eq!(parse(Some("a,b")), ["a,b"]);
        assert_eq!(parse(Some("a, b, ")), ["a", "b"]);
    }

    #[test]
    fn test_read_structured_list() {
        let mut headers = Headers::new();
        headers.add("tags", json!(["password-reset", "transactional"]));
        let message = Message::single_part(headers, Vec::new());
        assert_eq!(read(&message), ["password-reset", "transactional"]);
    }

    proptest! {
        #[test]
        fn prop_joined_tags_split_back(tags in prop::collection::vec("[a-z0-9_-]{1,12}", 1..8)) {
            let joined = tags.join(SEPARATOR);
            prop_assert_eq!(parse(Some(joined.as_str())), tags);
        }
    }
}
