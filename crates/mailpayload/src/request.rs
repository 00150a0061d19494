//! Send request envelopes.
//!
//! A message carrying a `template` header is sent through the template
//! endpoint with its `template_content`; everything else goes through the
//! plain send endpoint. Credentials are left to the transport.

use crate::error::Result;
use crate::field::ExtensionField;
use crate::payload::{Payload, PayloadAssembler, text};
use crate::raw;
use mailpayload_mime::Message;
use serde::Serialize;
use serde_json::Value;

/// Request body for one of the provider's send endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SendRequest {
    /// `messages/send`.
    Send {
        /// The message payload.
        message: Payload,
        /// Queue instead of sending inline.
        #[serde(rename = "async")]
        send_async: bool,
        /// Dedicated IP pool.
        #[serde(skip_serializing_if = "Option::is_none")]
        ip_pool: Option<String>,
    },
    /// `messages/send-template`.
    SendTemplate {
        /// Name of the stored template.
        template_name: String,
        /// Content blocks injected into the template.
        template_content: Value,
        /// The message payload.
        message: Payload,
        /// Queue instead of sending inline.
        #[serde(rename = "async")]
        send_async: bool,
        /// Dedicated IP pool.
        #[serde(skip_serializing_if = "Option::is_none")]
        ip_pool: Option<String>,
    },
}

impl SendRequest {
    /// API path of the endpoint this request targets.
    #[must_use]
    pub const fn endpoint(&self) -> &'static str {
        match self {
            Self::Send { .. } => "messages/send.json",
            Self::SendTemplate { .. } => "messages/send-template.json",
        }
    }

    /// The message payload.
    #[must_use]
    pub const fn payload(&self) -> &Payload {
        match self {
            Self::Send { message, .. } | Self::SendTemplate { message, .. } => message,
        }
    }

    /// Renders the request body as JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Into::into)
    }
}

impl PayloadAssembler {
    /// Builds the send request for `message`.
    ///
    /// # Errors
    ///
    /// Fails for the same reasons as [`PayloadAssembler::assemble`], or when
    /// `template_content` holds malformed data.
    pub fn request(&self, message: &Message) -> Result<SendRequest> {
        let payload = self.assemble(message)?;
        let config = self.config();

        let request = match text(message, ExtensionField::Template) {
            Some(template_name) => SendRequest::SendTemplate {
                template_name,
                template_content: raw::json_value(message, ExtensionField::TemplateContent)?
                    .unwrap_or_else(|| Value::Array(Vec::new())),
                message: payload,
                send_async: config.send_async,
                ip_pool: config.ip_pool.clone(),
            },
            None => SendRequest::Send {
                message: payload,
                send_async: config.send_async,
                ip_pool: config.ip_pool.clone(),
            },
        };

        tracing::debug!(endpoint = request.endpoint(), "Built send request");
        Ok(request)
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
    use crate::Config;
    use mailpayload_mime::Headers;
    use serde_json::json;

    fn message(extra: &[(&str, Value)]) -> Message {
        let mut headers = Headers::new();
        headers.add("From", "sender@x.com");
        headers.add("To", "a@x.com");
        for (name, value) in extra {
            headers.add(*name, value.clone());
        }
        Message::single_part(headers, b"Hi".to_vec())
    }

    #[test]
    fn test_plain_send() {
        let request = PayloadAssembler::default().request(&message(&[])).unwrap();
        assert_eq!(request.endpoint(), "messages/send.json");

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["async"], json!(false));
        assert!(value.get("ip_pool").is_none());
        assert!(value.get("template_name").is_none());
        assert_eq!(value["message"]["from_email"], json!("sender@x.com"));
    }

    #[test]
    fn test_template_send() {
        let message = message(&[
            ("template", json!("welcome-v2")),
            ("template_content", json!([{"name": "header", "content": "<h1>Hi</h1>"}])),
        ]);
        let assembler = PayloadAssembler::new(
            Config::builder().send_async(true).ip_pool("Main Pool").build(),
        );
        let request = assembler.request(&message).unwrap();

        assert_eq!(request.endpoint(), "messages/send-template.json");
        assert_eq!(request.payload().to[0].email, "a@x.com");

        let value: Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();
        assert_eq!(value["template_name"], json!("welcome-v2"));
        assert_eq!(value["template_content"][0]["name"], json!("header"));
        assert_eq!(value["async"], json!(true));
        assert_eq!(value["ip_pool"], json!("Main Pool"));
    }

    #[test]
    fn test_template_without_content() {
        let message = message(&[("template", json!("receipt"))]);
        let request = PayloadAssembler::default().request(&message).unwrap();
        match request {
            SendRequest::SendTemplate { template_content, .. } => {
                assert_eq!(template_content, json!([]));
            }
            SendRequest::Send { .. } => panic!("expected a template request"),
        }
    }
}
