//! Hosted chat API backend.
//!
//! Request/response calls over reqwest plus a server-sent event listener for
//! `message_created` events.

pub mod client;
pub mod streaming;
pub mod types;

pub use client::HostedChatBackend;
