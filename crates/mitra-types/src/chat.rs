//! Chat message, phase, and notice types for Mitra.
//!
//! These types model one conversation screen: the ordered message log,
//! the send phase that gates new messages, and the transient notices
//! surfaced to the user when a send fails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::error::{ChatError, TransportError};

/// Id of the canned greeting. Stable across resets.
pub const GREETING_ID: &str = "1";

/// Default welcome text of the canned greeting.
pub const DEFAULT_GREETING: &str = "👋 Hello! I'm KIIT MITRA. I'm here to help you with questions, provide information, and have engaging conversations. What would you like to talk about today?";

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Bot => write!(f, "bot"),
        }
    }
}

impl FromStr for Sender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Sender::User),
            "bot" => Ok(Sender::Bot),
            other => Err(format!("invalid sender: '{other}'")),
        }
    }
}

/// A single entry in the conversation log.
///
/// Immutable once created. The log's insertion order is its display order;
/// `timestamp` serializes as an RFC 3339 string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// A user-authored message with a fresh id and the current time.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: fresh_id(Sender::User),
            content: content.into(),
            sender: Sender::User,
            timestamp: Utc::now(),
        }
    }

    /// A bot reply with a fresh id.
    ///
    /// Uses `timestamp` when the backend supplied one, otherwise now.
    pub fn bot(content: impl Into<String>, timestamp: Option<DateTime<Utc>>) -> Self {
        Self {
            id: fresh_id(Sender::Bot),
            content: content.into(),
            sender: Sender::Bot,
            timestamp: timestamp.unwrap_or_else(Utc::now),
        }
    }

    /// The canned greeting that opens every conversation.
    pub fn greeting(content: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: GREETING_ID.to_string(),
            content: content.into(),
            sender: Sender::Bot,
            timestamp: at,
        }
    }

    pub fn is_greeting(&self) -> bool {
        self.id == GREETING_ID && self.sender == Sender::Bot
    }
}

/// Time-sortable unique id suffixed with the sender, e.g. `0190...-user`.
fn fresh_id(sender: Sender) -> String {
    format!("{}-{sender}", Uuid::now_v7())
}

/// Where a conversation is in its send cycle.
///
/// `Idle → Sending → AwaitingReply → Idle`. Only `Idle` accepts a new send.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatPhase {
    #[default]
    Idle,
    Sending,
    AwaitingReply,
}

impl ChatPhase {
    /// Whether the typing indicator should be shown in this phase.
    pub fn is_typing(self) -> bool {
        matches!(self, ChatPhase::Sending | ChatPhase::AwaitingReply)
    }
}

impl fmt::Display for ChatPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatPhase::Idle => write!(f, "idle"),
            ChatPhase::Sending => write!(f, "sending"),
            ChatPhase::AwaitingReply => write!(f, "awaiting_reply"),
        }
    }
}

/// Category of a transient user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// No user is signed in; the view must send them to sign-in.
    SignInRequired,
    /// The backend rejected the session; sign in again.
    SessionExpired,
    /// The bot did not answer before the reply timeout.
    NoReply,
    /// Any other send failure; the user may retry.
    SendFailed,
}

/// A transient notification with recovery guidance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn sign_in_required() -> Self {
        Self {
            kind: NoticeKind::SignInRequired,
            title: "Please sign in".to_string(),
            description: "You need to be signed in to access the chat.".to_string(),
        }
    }

    pub fn session_expired() -> Self {
        Self {
            kind: NoticeKind::SessionExpired,
            title: "Session expired".to_string(),
            description: "Please sign in again.".to_string(),
        }
    }

    pub fn no_reply() -> Self {
        Self {
            kind: NoticeKind::NoReply,
            title: "No reply".to_string(),
            description: "The assistant did not answer in time. Send your message again to retry."
                .to_string(),
        }
    }

    pub fn send_failed(detail: &str) -> Self {
        Self {
            kind: NoticeKind::SendFailed,
            title: "Message not delivered".to_string(),
            description: format!("{detail}. Please try again."),
        }
    }

    /// Whether the presentation layer should redirect to sign-in.
    pub fn requires_sign_in(&self) -> bool {
        matches!(
            self.kind,
            NoticeKind::SignInRequired | NoticeKind::SessionExpired
        )
    }
}

impl From<&TransportError> for Notice {
    fn from(err: &TransportError) -> Self {
        match err {
            TransportError::Unauthorized => Notice::session_expired(),
            TransportError::Timeout(_) => Notice::no_reply(),
            TransportError::Backend(detail) => Notice::send_failed(detail),
        }
    }
}

impl From<&ChatError> for Notice {
    fn from(err: &ChatError) -> Self {
        match err {
            ChatError::NotAuthenticated => Notice::sign_in_required(),
            ChatError::NotStarted => Notice::send_failed("The conversation is not open yet"),
            ChatError::Transport(err) => Notice::from(err),
        }
    }
}
