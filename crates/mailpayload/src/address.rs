//! Address-list resolution.

use mailpayload_mime::Message;
use serde::Serialize;

/// Address-list headers merged into the payload's `to`, in order.
const RECIPIENT_FIELDS: [&str; 3] = ["to", "cc", "bcc"];

/// One resolved address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressField {
    /// Bare address.
    pub email: String,
    /// Display name, empty when none was given.
    pub name: String,
    /// Lowercased name of the header the address came from.
    #[serde(rename = "type")]
    pub kind: String,
}

/// Resolves one address-list header into address fields.
///
/// An absent header resolves to an empty list.
#[must_use]
pub fn resolve(message: &Message, field: &str) -> Vec<AddressField> {
    let Some(header) = message.header(field) else {
        return Vec::new();
    };
    let kind = header.name().to_lowercase();

    message
        .addresses(field)
        .unwrap_or_default()
        .into_iter()
        .map(|mailbox| AddressField {
            email: mailbox.address,
            name: mailbox.name,
            kind: kind.clone(),
        })
        .collect()
}

/// Resolves `to`, `cc` and `bcc` into one list grouped by field.
#[must_use]
pub fn recipients(message: &Message) -> Vec<AddressField> {
    RECIPIENT_FIELDS
        .iter()
        .flat_map(|field| resolve(message, field))
        .collect()
}

/// Resolves the first `from` address.
#[must_use]
pub fn sender(message: &Message) -> Option<AddressField> {
    resolve(message, "from").into_iter().next()
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

    fn message(fields: &[(&str, &str)]) -> Message {
        let mut headers = Headers::new();
        for (name, value) in fields {
            headers.add(*name, *value);
        }
        Message::single_part(headers, Vec::new())
    }

    #[test]
    fn test_resolve_splits_display_names() {
        let message = message(&[("To", "Jane Doe <jane@x.com>, bob@x.com")]);
        let to = resolve(&message, "to");

        assert_eq!(
            to,
            vec![
                AddressField {
                    email: "jane@x.com".into(),
                    name: "Jane Doe".into(),
                    kind: "to".into(),
                },
                AddressField {
                    email: "bob@x.com".into(),
                    name: String::new(),
                    kind: "to".into(),
                },
            ]
        );
    }

    #[test]
    fn test_resolve_absent_field() {
        let message = message(&[("To", "a@x.com")]);
        assert!(resolve(&message, "cc").is_empty());
    }

    #[test]
    fn test_recipients_group_by_field() {
        let message = message(&[
            ("Bcc", "hidden@x.com"),
            ("To", "a@x.com, b@x.com"),
            ("CC", "Carol <c@x.com>"),
        ]);
        let all = recipients(&message);

        let summary: Vec<_> = all
            .iter()
            .map(|a| (a.email.as_str(), a.kind.as_str()))
            .collect();
        assert_eq!(
            summary,
            [
                ("a@x.com", "to"),
                ("b@x.com", "to"),
                ("c@x.com", "cc"),
                ("hidden@x.com", "bcc"),
            ]
        );
    }

    #[test]
    fn test_sender_uses_first_address() {
        let message = message(&[("From", "\"Ops, Team\" <ops@x.com>, other@x.com")]);
        let from = sender(&message).unwrap();
        assert_eq!(from.email, "ops@x.com");
        assert_eq!(from.name, "Ops, Team");
        assert_eq!(from.kind, "from");
    }

    #[test]
    fn test_sender_absent() {
        assert!(sender(&message(&[])).is_none());
    }

    #[test]
    fn test_serializes_type_key() {
        let field = AddressField {
            email: "a@x.com".into(),
            name: String::new(),
            kind: "cc".into(),
        };
        assert_eq!(
            serde_json::to_value(&field).unwrap(),
            json!({"email": "a@x.com", "name": "", "type": "cc"})
        );
    }
}
