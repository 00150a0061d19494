//! Header flattening.

use mailpayload_mime::Message;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Ordered header name → value mapping.
///
/// Names keep their source case and are compared exactly. Inserting an
/// existing name replaces its value in place, so the entry keeps the
/// position of its first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, overwriting any earlier value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Gets the value stored for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for HeaderMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Flattens every header field of the message, last value wins.
#[must_use]
pub fn collect(message: &Message) -> HeaderMap {
    message
        .header_fields()
        .fold(HeaderMap::new(), |mut map, field| {
            map.insert(field.name(), field.formatted_value());
            map
        })
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
    use serde_json::json;

    #[test]
    fn test_last_duplicate_wins() {
        let mut headers = Headers::new();
        headers.add("X-Foo", "1");
        headers.add("Subject", "Hi");
        headers.add("X-Foo", "2");
        let map = collect(&Message::single_part(headers, Vec::new()));

        assert_eq!(map.get("X-Foo"), Some("2"));
        assert_eq!(map.len(), 2);
        let names: Vec<_> = map.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["X-Foo", "Subject"]);
    }

    #[test]
    fn test_names_compare_exactly() {
        let mut map = HeaderMap::new();
        map.insert("X-Foo", "1");
        map.insert("x-foo", "2");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("X-Foo"), Some("1"));
    }

    #[test]
    fn test_values_are_formatted() {
        let mut headers = Headers::new();
        headers.add("tags", json!(["a", "b"]));
        headers.add("X-Folded", "one\r\n two");
        let map = collect(&Message::single_part(headers, Vec::new()));

        assert_eq!(map.get("tags"), Some("a, b"));
        assert_eq!(map.get("X-Folded"), Some("one two"));
    }

    #[test]
    fn test_serializes_as_object_in_order() {
        let mut map = HeaderMap::new();
        map.insert("Reply-To", "r@x.com");
        map.insert("X-Campaign", "spring");
        assert_eq!(
            serde_json::to_string(&map).unwrap(),
            r#"{"Reply-To":"r@x.com","X-Campaign":"spring"}"#
        );
        assert!(HeaderMap::new().is_empty());
        assert_eq!(serde_json::to_value(HeaderMap::new()).unwrap(), json!({}));
    }
}
