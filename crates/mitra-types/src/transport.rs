//! Identifiers and events exchanged with a chat backend.
//!
//! The transport handle is an explicitly owned value: a conversation session
//! acquires it once and passes it to every adapter call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;

/// Identity of a participant on the backend (the local client or the bot).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backend-assigned conversation id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An established link to a backend endpoint.
///
/// Any secret the backend issued on connect stays inside the backend,
/// keyed by `user_id`; the handle itself carries no credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHandle {
    pub endpoint_id: String,
    pub user_id: ParticipantId,
}

/// A connected client plus its active conversation.
#[derive(Debug, Clone)]
pub struct TransportHandle {
    pub client: ClientHandle,
    pub conversation_id: ConversationId,
}

/// A `message_created` event observed on a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyEvent {
    pub message_id: String,
    pub conversation_id: ConversationId,
    /// Who authored the message. Equal to the local client's id for echoes.
    pub user_id: ParticipantId,
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// The single bot reply consumed by one send.
#[derive(Debug, Clone, PartialEq)]
pub struct BotReply {
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<ReplyEvent> for BotReply {
    fn from(event: ReplyEvent) -> Self {
        Self {
            text: event.text,
            created_at: event.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_transparently() {
        let id = ConversationId("conv_1".to_string());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"conv_1\"");
        assert_eq!(ParticipantId("bot".to_string()).to_string(), "bot");
    }

    #[test]
    fn test_reply_from_event() {
        let event = ReplyEvent {
            message_id: "m1".to_string(),
            conversation_id: ConversationId("c".to_string()),
            user_id: ParticipantId("bot".to_string()),
            text: "hello".to_string(),
            created_at: None,
        };
        let reply = BotReply::from(event);
        assert_eq!(reply.text, "hello");
        assert!(reply.created_at.is_none());
    }
}
