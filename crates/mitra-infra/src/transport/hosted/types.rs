//! Request/response types for the hosted chat API.
//!
//! These mirror the JSON wire format of the webhook-addressed chat API and
//! are internal to the hosted backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Empty JSON object body (`{}`) for create calls.
#[derive(Debug, Serialize)]
pub struct EmptyBody {}

/// Response of `POST /users`.
#[derive(Debug, Deserialize)]
pub struct CreateUserResponse {
    pub user: WireUser,
    /// Secret used as the `x-user-key` header on every later call.
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct WireUser {
    pub id: String,
}

/// Response of `POST /conversations`.
#[derive(Debug, Deserialize)]
pub struct CreateConversationResponse {
    pub conversation: WireConversation,
}

#[derive(Debug, Deserialize)]
pub struct WireConversation {
    pub id: String,
}

/// Body of `POST /messages`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageRequest<'a> {
    pub conversation_id: &'a str,
    pub payload: TextPayload<'a>,
}

#[derive(Debug, Serialize)]
pub struct TextPayload<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: &'a str,
}

impl<'a> TextPayload<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { kind: "text", text }
    }
}

/// One server-sent event on `GET /conversations/{id}/listen`.
///
/// `data` is only decoded further when `kind` is `message_created`.
#[derive(Debug, Deserialize)]
pub struct ListenEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// A message as it appears in `message_created` events.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    pub id: String,
    pub conversation_id: String,
    pub user_id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub payload: WirePayload,
}

#[derive(Debug, Deserialize)]
pub struct WirePayload {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub markdown: Option<String>,
}

impl WirePayload {
    /// Displayable text of a text or markdown payload.
    pub fn into_text(self) -> Option<String> {
        match self.kind.as_str() {
            "text" => self.text,
            "markdown" => self.markdown.or(self.text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_request_shape() {
        let body = CreateMessageRequest {
            conversation_id: "conv_1",
            payload: TextPayload::new("hello"),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "conversationId": "conv_1",
                "payload": { "type": "text", "text": "hello" }
            })
        );
    }

    #[test]
    fn test_create_user_response_parses() {
        let json = r#"{"user":{"id":"user_01","createdAt":"2024-01-01T00:00:00Z"},"key":"k-123"}"#;
        let resp: CreateUserResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.user.id, "user_01");
        assert_eq!(resp.key, "k-123");
    }

    #[test]
    fn test_payload_text_extraction() {
        let text = WirePayload {
            kind: "text".to_string(),
            text: Some("hi".to_string()),
            markdown: None,
        };
        assert_eq!(text.into_text().as_deref(), Some("hi"));

        let markdown = WirePayload {
            kind: "markdown".to_string(),
            text: None,
            markdown: Some("**hi**".to_string()),
        };
        assert_eq!(markdown.into_text().as_deref(), Some("**hi**"));

        let image = WirePayload {
            kind: "image".to_string(),
            text: None,
            markdown: None,
        };
        assert!(image.into_text().is_none());
    }
}
