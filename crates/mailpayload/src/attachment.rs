//! Attachment classification.

use mailpayload_mime::encoding::encode_base64;
use mailpayload_mime::{Message, Part};
use serde::Serialize;

/// MIME type used when a part's content type cannot be parsed.
const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// One attachment or inline image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentField {
    /// Filename for attachments, content-id for inline images.
    pub name: String,
    /// Bare MIME type.
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Base64 of the decoded bytes.
    pub content: String,
}

/// Attachments split by disposition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    /// Downloadable attachments.
    pub regular: Vec<AttachmentField>,
    /// Inline parts referenced by content-id.
    pub inline: Vec<AttachmentField>,
}

/// Partitions the message's attachments into regular and inline sets.
///
/// Every attachment lands in exactly one set, decided by
/// [`Part::is_inline`].
#[must_use]
pub fn classify(message: &Message) -> Classified {
    let (inline, regular): (Vec<&Part>, Vec<&Part>) = message
        .attachments()
        .into_iter()
        .partition(|part| part.is_inline());

    Classified {
        regular: regular
            .into_iter()
            .map(|part| field(part, part.filename()))
            .collect(),
        inline: inline
            .into_iter()
            .map(|part| field(part, part.content_id().or_else(|| part.filename())))
            .collect(),
    }
}

fn field(part: &Part, name: Option<String>) -> AttachmentField {
    let mime_type = part.mime_type().unwrap_or_else(|| {
        tracing::warn!(name = ?name, "Unparsable attachment content type");
        FALLBACK_MIME_TYPE.to_string()
    });

    let bytes = part.decode_body().unwrap_or_else(|e| {
        tracing::warn!(?e, name = ?name, "Attachment failed to decode, sending raw bytes");
        part.body.clone()
    });

    AttachmentField {
        name: name.unwrap_or_default(),
        mime_type,
        content: encode_base64(&bytes),
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
    use mailpayload_mime::Headers;

    fn part(fields: &[(&str, &str)], body: &[u8]) -> Part {
        let mut headers = Headers::new();
        for (name, value) in fields {
            headers.add(*name, *value);
        }
        Part::new(headers, body.to_vec())
    }

    fn message(parts: Vec<Part>) -> Message {
        let mut headers = Headers::new();
        headers.add("Content-Type", "multipart/mixed; boundary=b");
        Message::multipart(headers, parts)
    }

    #[test]
    fn test_regular_attachment() {
        let message = message(vec![
            part(&[("Content-Type", "text/plain")], b"body"),
            part(
                &[
                    ("Content-Type", "application/pdf"),
                    ("Content-Disposition", "attachment; filename=\"report.pdf\""),
                ],
                b"%PDF-",
            ),
        ]);
        let classified = classify(&message);

        assert!(classified.inline.is_empty());
        assert_eq!(
            classified.regular,
            vec![AttachmentField {
                name: "report.pdf".into(),
                mime_type: "application/pdf".into(),
                content: "JVBERi0=".into(),
            }]
        );
    }

    #[test]
    fn test_inline_image_named_by_content_id() {
        let message = message(vec![part(
            &[
                ("Content-Type", "image/png; name=logo.png"),
                ("Content-Disposition", "inline; filename=logo.png"),
                ("Content-ID", "<logo@x>"),
                ("Content-Transfer-Encoding", "base64"),
            ],
            b"iVBO\r\nRw==",
        )]);
        let classified = classify(&message);

        assert!(classified.regular.is_empty());
        assert_eq!(classified.inline.len(), 1);
        assert_eq!(classified.inline[0].name, "logo@x");
        assert_eq!(classified.inline[0].mime_type, "image/png");
        assert_eq!(classified.inline[0].content, "iVBORw==");
    }

    #[test]
    fn test_inline_without_content_id_uses_filename() {
        let message = message(vec![part(
            &[
                ("Content-Type", "image/gif"),
                ("Content-Disposition", "inline; filename=dot.gif"),
            ],
            b"GIF89a",
        )]);
        let classified = classify(&message);
        assert_eq!(classified.inline[0].name, "dot.gif");
    }

    #[test]
    fn test_attachment_with_content_id_stays_regular() {
        let message = message(vec![part(
            &[
                ("Content-Type", "application/pdf"),
                ("Content-Disposition", "attachment; filename=\"terms.pdf\""),
                ("Content-ID", "<abc@mail>"),
            ],
            b"%PDF-",
        )]);
        let classified = classify(&message);

        assert!(classified.inline.is_empty());
        assert_eq!(classified.regular.len(), 1);
        assert_eq!(classified.regular[0].name, "terms.pdf");
    }

    #[test]
    fn test_sets_are_disjoint_and_exhaustive() {
        let message = message(vec![
            part(&[("Content-Disposition", "attachment; filename=a.txt")], b"a"),
            part(&[("Content-Type", "image/png"), ("Content-ID", "<b>")], b"b"),
            part(&[("Content-Type", "text/csv; name=c.csv")], b"c"),
        ]);
        let classified = classify(&message);

        let regular: Vec<_> = classified.regular.iter().map(|a| a.name.as_str()).collect();
        let inline: Vec<_> = classified.inline.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(regular, ["a.txt", "c.csv"]);
        assert_eq!(inline, ["b"]);
        assert_eq!(regular.len() + inline.len(), message.attachments().len());
    }

    #[test]
    fn test_undecodable_body_falls_back_to_raw_bytes() {
        let message = message(vec![part(
            &[
                ("Content-Disposition", "attachment; filename=x.bin"),
                ("Content-Transfer-Encoding", "base64"),
            ],
            b"!!!",
        )]);
        let classified = classify(&message);
        assert_eq!(classified.regular[0].content, encode_base64(b"!!!"));
        assert_eq!(classified.regular[0].mime_type, "text/plain");
    }

    #[test]
    fn test_single_part_message_has_no_attachments() {
        let message = Message::single_part(Headers::new(), b"hello".to_vec());
        assert_eq!(classify(&message), Classified::default());
    }
}
