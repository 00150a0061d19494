//! End-to-end tests: raw messages in, provider payloads out.

#![allow(clippy::unwrap_used, clippy::unreadable_literal)]

use chrono::{TimeZone, Utc};
use mailpayload::{Error, PayloadAssembler, SendRequest, TriState, to_payload};
use mailpayload_mime::{Headers, Message};
use serde_json::{Value, json};

const TRI_STATE_KEYS: [&str; 9] = [
    "auto_html",
    "auto_text",
    "inline_css",
    "merge",
    "preserve_recipients",
    "track_clicks",
    "track_opens",
    "url_strip_qs",
    "view_content_link",
];

const NEWSLETTER: &str = concat!(
    "From: \"Acme, Inc.\" <news@acme.test>\r\n",
    "To: Jane Doe <jane@x.com>, bob@x.com\r\n",
    "Cc: carol@x.com\r\n",
    "Bcc: =?utf-8?Q?Z=C3=B6e?= <zoe@x.com>\r\n",
    "Subject: =?utf-8?B?U3ByaW5nIG5ld3M=?=\r\n",
    "X-Foo: 1\r\n",
    "X-Foo: 2\r\n",
    "track_opens: true\r\n",
    "track_clicks: TRUE\r\n",
    "important: true\r\n",
    "tags: newsletter, spring\r\n",
    "global_merge_vars: [{\"name\":\"FNAME\",\"content\":\"Jane\"},\r\n",
    " {\"name\":\"COMPANY\",\"content\":\"Acme\"}]\r\n",
    "send_at: 2024-03-01 13:05:09\r\n",
    "Content-Type: multipart/mixed; boundary=\"mixed\"\r\n",
    "\r\n",
    "--mixed\r\n",
    "Content-Type: multipart/related; boundary=\"related\"\r\n",
    "\r\n",
    "--related\r\n",
    "Content-Type: multipart/alternative; boundary=\"alt\"\r\n",
    "\r\n",
    "--alt\r\n",
    "Content-Type: text/plain; charset=utf-8\r\n",
    "\r\n",
    "Hello Jane\r\n",
    "--alt\r\n",
    "Content-Type: text/html; charset=utf-8\r\n",
    "Content-Transfer-Encoding: quoted-printable\r\n",
    "\r\n",
    "<p>Hello Jane <img src=3D\"cid:logo@acme\"></p>\r\n",
    "--alt--\r\n",
    "--related\r\n",
    "Content-Type: image/png\r\n",
    "Content-ID: <logo@acme>\r\n",
    "Content-Disposition: inline\r\n",
    "Content-Transfer-Encoding: base64\r\n",
    "\r\n",
    "iVBORw==\r\n",
    "--related--\r\n",
    "--mixed\r\n",
    "Content-Type: application/pdf\r\n",
    "Content-Disposition: attachment; filename=\"terms.pdf\"\r\n",
    "Content-Transfer-Encoding: base64\r\n",
    "\r\n",
    "JVBERi0=\r\n",
    "--mixed--\r\n",
);

fn plain(extra_headers: &str) -> Message {
    let raw = format!(
        "From: sender@x.com\r\nTo: a@x.com\r\nSubject: Hi\r\n{extra_headers}\r\nHello"
    );
    Message::parse(&raw).unwrap()
}

#[test]
fn no_custom_headers_leaves_options_unset() {
    let value = to_payload(&plain("")).unwrap().to_value().unwrap();

    for key in TRI_STATE_KEYS {
        assert_eq!(value[key], Value::Null, "{key} should be null");
    }
    assert_eq!(value["tags"], json!([]));
    assert_eq!(value["important"], json!(false));
    assert_eq!(value["send_at"], Value::Null);
    assert_eq!(value["global_merge_vars"], Value::Null);
    assert!(value.get("attachments").is_none());
    assert!(value.get("images").is_none());
    assert_eq!(value["text"], json!("Hello"));
    assert_eq!(value["html"], Value::Null);
}

#[test]
fn recipients_keep_names_and_field_grouping() {
    let payload = to_payload(&Message::parse(NEWSLETTER).unwrap()).unwrap();

    assert_eq!(
        serde_json::to_value(&payload.to).unwrap(),
        json!([
            {"email": "jane@x.com", "name": "Jane Doe", "type": "to"},
            {"email": "bob@x.com", "name": "", "type": "to"},
            {"email": "carol@x.com", "name": "", "type": "cc"},
            {"email": "zoe@x.com", "name": "Zöe", "type": "bcc"},
        ])
    );
    assert_eq!(payload.from_email.as_deref(), Some("news@acme.test"));
    assert_eq!(payload.from_name.as_deref(), Some("Acme, Inc."));
    assert_eq!(payload.subject.as_deref(), Some("Spring news"));
}

#[test]
fn attachments_and_images_are_split() {
    let value = to_payload(&Message::parse(NEWSLETTER).unwrap())
        .unwrap()
        .to_value()
        .unwrap();

    assert_eq!(
        value["attachments"],
        json!([{"name": "terms.pdf", "type": "application/pdf", "content": "JVBERi0="}])
    );
    assert_eq!(
        value["images"],
        json!([{"name": "logo@acme", "type": "image/png", "content": "iVBORw=="}])
    );
}

#[test]
fn bodies_come_from_typed_parts() {
    let payload = to_payload(&Message::parse(NEWSLETTER).unwrap()).unwrap();

    assert_eq!(payload.text.as_deref(), Some("Hello Jane"));
    assert_eq!(
        payload.html.as_deref(),
        Some("<p>Hello Jane <img src=\"cid:logo@acme\"></p>")
    );
}

#[test]
fn only_attachment_produces_no_images_key() {
    let raw = concat!(
        "To: a@x.com\r\n",
        "Content-Type: multipart/mixed; boundary=b\r\n",
        "\r\n",
        "--b\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "see attached\r\n",
        "--b\r\n",
        "Content-Type: text/csv; name=\"data.csv\"\r\n",
        "Content-Disposition: attachment; filename=\"data.csv\"\r\n",
        "\r\n",
        "a,b\r\n",
        "--b--\r\n",
    );
    let value = to_payload(&Message::parse(raw).unwrap()).unwrap().to_value().unwrap();

    assert_eq!(value["attachments"][0]["name"], json!("data.csv"));
    assert_eq!(value["attachments"][0]["content"], json!("YSxi"));
    assert!(value.get("images").is_none());
    assert_eq!(value["html"], Value::Null);
}

#[test]
fn send_at_formats() {
    let mut message = plain("");
    message
        .headers
        .set("send_at", Utc.with_ymd_and_hms(2024, 3, 1, 13, 5, 9).unwrap());
    assert_eq!(
        to_payload(&message).unwrap().send_at.as_deref(),
        Some("2024-03-01 13:05:09")
    );

    let parsed = to_payload(&Message::parse(NEWSLETTER).unwrap()).unwrap();
    assert_eq!(parsed.send_at.as_deref(), Some("2024-03-01 13:05:09"));

    message.headers.set("send_at", json!({"when": "soon"}));
    assert!(matches!(to_payload(&message), Err(Error::InvalidSendAtType(_))));
}

#[test]
fn global_merge_vars_text_is_json() {
    let payload = to_payload(&Message::parse(NEWSLETTER).unwrap()).unwrap();
    assert_eq!(
        payload.global_merge_vars,
        Some(json!([
            {"name": "FNAME", "content": "Jane"},
            {"name": "COMPANY", "content": "Acme"}
        ]))
    );

    let mut message = plain("");
    message.headers.add(
        "global_merge_vars",
        "[{\"name\":\"FOO\",\"content\":\"bar\"}]\r\n",
    );
    assert_eq!(
        to_payload(&message).unwrap().global_merge_vars,
        Some(json!([{"name": "FOO", "content": "bar"}]))
    );

    let message = plain("global_merge_vars: `rm -rf /`\r\n");
    assert!(matches!(
        to_payload(&message),
        Err(Error::MalformedMergeVarsJson(_))
    ));
}

#[test]
fn structured_merge_vars_survive_folding() {
    let vars = json!([
        {"rcpt": "jane@x.com", "vars": [{"name": "FNAME", "content": "Jane"}]},
        {"rcpt": "bob@x.com", "vars": [{"name": "FNAME", "content": "Bob"}]}
    ]);
    let mut headers = Headers::new();
    headers.add("To", "jane@x.com, bob@x.com");
    headers.add("merge_vars", vars.clone());
    headers.add("global_merge_vars", json!([{"name": "A", "content": "1"}]));
    let payload = to_payload(&Message::single_part(headers, Vec::new())).unwrap();

    assert_eq!(payload.merge_vars, Some(vars));
    assert_eq!(payload.global_merge_vars, Some(json!([{"name": "A", "content": "1"}])));
}

#[test]
fn duplicate_headers_last_wins() {
    let payload = to_payload(&Message::parse(NEWSLETTER).unwrap()).unwrap();
    assert_eq!(payload.headers.get("X-Foo"), Some("2"));
    assert_eq!(payload.headers.get("track_opens"), Some("true"));
}

#[test]
fn important_is_exact_and_two_valued() {
    assert!(!to_payload(&plain("")).unwrap().important);
    assert!(to_payload(&plain("important: true\r\n")).unwrap().important);
    assert!(!to_payload(&plain("important: TRUE\r\n")).unwrap().important);
    assert!(!to_payload(&plain("important: 1\r\n")).unwrap().important);
}

#[test]
fn tri_states_read_exact_true() {
    let payload = to_payload(&Message::parse(NEWSLETTER).unwrap()).unwrap();
    assert_eq!(payload.track_opens, TriState::True);
    assert_eq!(payload.track_clicks, TriState::False);
    assert_eq!(payload.auto_text, TriState::Absent);
    assert_eq!(payload.tags, ["newsletter", "spring"]);
}

#[test]
fn template_header_selects_template_endpoint() {
    let message = plain("template: welcome\r\n");
    let request = PayloadAssembler::default().request(&message).unwrap();

    assert!(matches!(request, SendRequest::SendTemplate { .. }));
    assert_eq!(request.endpoint(), "messages/send-template.json");
    let body: Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();
    assert_eq!(body["template_name"], json!("welcome"));
    assert_eq!(body["template_content"], json!([]));
    assert_eq!(body["message"]["subject"], json!("Hi"));
}

#[test]
fn multipart_without_html_part_has_null_html() {
    let raw = concat!(
        "To: a@x.com\r\n",
        "Content-Type: multipart/alternative; boundary=alt\r\n",
        "\r\n",
        "--alt\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "only text\r\n",
        "--alt--\r\n",
    );
    let payload = to_payload(&Message::parse(raw).unwrap()).unwrap();

    assert_eq!(payload.html, None);
    assert_eq!(payload.text.as_deref(), Some("only text"));
}

#[test]
fn latin1_subject_sender_and_body_decode() {
    let raw = concat!(
        "From: =?ISO-8859-1?Q?Ren=E9?= <r@x.com>\r\n",
        "To: a@x.com\r\n",
        "Subject: =?ISO-8859-1?Q?caf=E9?=\r\n",
        "Content-Type: text/plain; charset=iso-8859-1\r\n",
        "Content-Transfer-Encoding: quoted-printable\r\n",
        "\r\n",
        "caf=E9",
    );
    let payload = to_payload(&Message::parse(raw).unwrap()).unwrap();

    assert_eq!(payload.subject.as_deref(), Some("café"));
    assert_eq!(payload.from_name.as_deref(), Some("René"));
    assert_eq!(payload.text.as_deref(), Some("café"));
}

#[test]
fn latin1_body_part_decodes() {
    let raw = concat!(
        "To: a@x.com\r\n",
        "Content-Type: multipart/alternative; boundary=alt\r\n",
        "\r\n",
        "--alt\r\n",
        "Content-Type: text/html; charset=\"windows-1252\"\r\n",
        "Content-Transfer-Encoding: quoted-printable\r\n",
        "\r\n",
        "<p>=93caf=E9=94</p>\r\n",
        "--alt--\r\n",
    );
    let payload = to_payload(&Message::parse(raw).unwrap()).unwrap();

    assert_eq!(payload.html.as_deref(), Some("<p>\u{201c}café\u{201d}</p>"));
    assert_eq!(payload.text, None);
}
