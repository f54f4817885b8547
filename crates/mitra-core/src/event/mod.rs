//! Event bus for conversation events.
//!
//! Provides a `ReplyBus` that distributes `ReplyEvent` messages to all
//! listeners via a `tokio::sync::broadcast` channel.

pub mod bus;

pub use bus::ReplyBus;
