//! Address-list parsing (RFC 5322 §3.4).

use crate::encoding::decode_encoded_words;
use std::fmt;

/// Mailbox: a display name (possibly empty) and an address.
///
/// - `"Jane Doe <jane@example.com>"` → `name = "Jane Doe"`, `address = "jane@example.com"`
/// - `"bob@example.com"` → `name = ""`, `address = "bob@example.com"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Display name, empty when none was given.
    pub name: String,
    /// Bare address (`local@domain`).
    pub address: String,
}

impl Mailbox {
    /// Parses a single mailbox.
    ///
    /// Supported formats:
    /// - `user@domain.com`
    /// - `<user@domain.com>`
    /// - `Display Name <user@domain.com>`
    /// - `"Display, Name" <user@domain.com>`
    ///
    /// Encoded-words in the display name are decoded. Input that does not
    /// look like an address is kept verbatim as the address.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        if let (Some(open), Some(close)) = (trimmed.rfind('<'), trimmed.rfind('>')) {
            if close > open {
                let address = trimmed[open + 1..close].trim().to_string();
                let name = decode_encoded_words(&strip_quotes(&trimmed[..open]));
                return Self { name, address };
            }
        }

        Self {
            name: String::new(),
            address: trimmed.to_string(),
        }
    }

    /// Parses a comma-separated address list.
    ///
    /// Commas inside quoted display names or angle brackets do not split.
    /// Entries with an empty address are dropped.
    #[must_use]
    pub fn parse_list(raw: &str) -> Vec<Self> {
        let mut results = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut in_angle = false;

        for ch in raw.chars() {
            match ch {
                '"' => {
                    in_quotes = !in_quotes;
                    current.push(ch);
                }
                '<' if !in_quotes => {
                    in_angle = true;
                    current.push(ch);
                }
                '>' if !in_quotes => {
                    in_angle = false;
                    current.push(ch);
                }
                ',' if !in_quotes && !in_angle => {
                    results.push(Self::parse(&current));
                    current.clear();
                }
                _ => current.push(ch),
            }
        }
        results.push(Self::parse(&current));

        results.retain(|mailbox| !mailbox.address.is_empty());
        results
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.address)
        } else {
            write!(f, "{} <{}>", self.name, self.address)
        }
    }
}

/// Strips surrounding double-quotes and whitespace.
fn strip_quotes(s: &str) -> String {
    let trimmed = s.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(trimmed)
        .trim()
        .to_string()
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
    use proptest::prelude::*;

    #[test]
    fn test_parse_bare_address() {
        let mailbox = Mailbox::parse("  user@example.com ");
        assert_eq!(mailbox.address, "user@example.com");
        assert_eq!(mailbox.name, "");
    }

    #[test]
    fn test_parse_angle_address() {
        let mailbox = Mailbox::parse("<user@example.com>");
        assert_eq!(mailbox.address, "user@example.com");
        assert_eq!(mailbox.name, "");
    }

    #[test]
    fn test_parse_display_name() {
        let mailbox = Mailbox::parse("Jane Doe <jane@example.com>");
        assert_eq!(mailbox.name, "Jane Doe");
        assert_eq!(mailbox.address, "jane@example.com");
        assert_eq!(mailbox.to_string(), "Jane Doe <jane@example.com>");
    }

    #[test]
    fn test_parse_encoded_display_name() {
        let mailbox = Mailbox::parse("=?utf-8?Q?Ren=C3=A9e?= <renee@example.com>");
        assert_eq!(mailbox.name, "Renée");
    }

    #[test]
    fn test_parse_list_quoted_comma() {
        let list = Mailbox::parse_list("\"Doe, Jane\" <jane@x.com>, bob@x.com");
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name, "Doe, Jane");
        assert_eq!(list[0].address, "jane@x.com");
        assert_eq!(list[1].name, "");
        assert_eq!(list[1].address, "bob@x.com");
    }

    #[test]
    fn test_parse_list_drops_empty_entries() {
        assert!(Mailbox::parse_list("").is_empty());
        assert_eq!(Mailbox::parse_list("a@x.com, , b@x.com,").len(), 2);
    }

    proptest! {
        #[test]
        fn prop_display_round_trips(
            name in "[A-Za-z][A-Za-z ]{0,20}[A-Za-z]",
            local in "[a-z]{1,10}",
            domain in "[a-z]{1,10}\\.com",
        ) {
            let address = format!("{local}@{domain}");
            let mailbox = Mailbox::parse(&format!("{name} <{address}>"));
            prop_assert_eq!(mailbox.name, name);
            prop_assert_eq!(mailbox.address, address);
        }
    }
}
