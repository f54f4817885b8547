//! Chat transport abstractions for Mitra.
//!
//! - `ChatBackend`: RPITIT trait for concrete backend implementations
//! - `BoxChatBackend`: Object-safe wrapper for dynamic dispatch
//! - `TransportAdapter`: one send, exactly one bot reply, or a timeout

pub mod adapter;
pub mod backend;
pub mod box_backend;

pub use adapter::{TransportAdapter, DEFAULT_REPLY_TIMEOUT};
pub use backend::{ChatBackend, ReplyStream, Subscription};
pub use box_backend::BoxChatBackend;

#[cfg(test)]
pub(crate) mod testing;
