//! Conversation logic and port definitions for Mitra.
//!
//! This crate defines the "ports" (backend and auth traits) that the
//! infrastructure layer implements, plus the pure pieces of the chat view:
//! the markdown renderer and the conversation state machine. It depends only
//! on `mitra-types` -- never on `mitra-infra` or any network/IO crate.

pub mod auth;
pub mod chat;
pub mod event;
pub mod markdown;
pub mod transport;
