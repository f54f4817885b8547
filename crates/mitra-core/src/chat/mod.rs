//! Conversation state for the chat view.
//!
//! `session::ConversationSession` owns the ordered message log and the
//! send phase, and drives one send/await-reply cycle at a time through the
//! transport adapter.

pub mod session;

pub use session::{ConversationSession, IgnoreReason, SendOutcome, SendTicket};
