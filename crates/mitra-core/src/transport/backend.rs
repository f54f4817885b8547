//! ChatBackend trait definition.
//!
//! This is the outbound port every chat backend implements: connect to an
//! endpoint, open a conversation, publish text into it, and subscribe to the
//! messages created in it. Uses RPITIT for the request/response calls and a
//! boxed stream for subscriptions (streams need to be object-safe for the
//! `BoxChatBackend` wrapper).

use std::fmt;
use std::pin::Pin;

use futures_util::Stream;

use mitra_types::error::TransportError;
use mitra_types::transport::{ClientHandle, ConversationId, ReplyEvent};

/// Stream of `message_created` events on one conversation.
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<ReplyEvent, TransportError>> + Send + 'static>>;

/// A live listener on a conversation.
///
/// Dropping it closes the underlying stream; `ChatBackend::unsubscribe`
/// additionally lets the backend release server-side resources.
pub struct Subscription {
    pub id: String,
    pub conversation_id: ConversationId,
    pub events: ReplyStream,
}

impl Subscription {
    pub fn new(id: impl Into<String>, conversation_id: ConversationId, events: ReplyStream) -> Self {
        Self {
            id: id.into(),
            conversation_id,
            events,
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("conversation_id", &self.conversation_id)
            .finish_non_exhaustive()
    }
}

/// Trait for chat backends (hosted webhook API, local mock, ...).
///
/// Implementations live in mitra-infra (e.g., `HostedChatBackend`).
pub trait ChatBackend: Send + Sync {
    /// Human-readable backend name (e.g., "hosted", "mock").
    fn name(&self) -> &str;

    /// Establish a client identity on the endpoint.
    fn connect(
        &self,
        endpoint_id: &str,
    ) -> impl std::future::Future<Output = Result<ClientHandle, TransportError>> + Send;

    /// Open a new conversation for the connected client.
    fn create_conversation(
        &self,
        client: &ClientHandle,
    ) -> impl std::future::Future<Output = Result<ConversationId, TransportError>> + Send;

    /// Post a text message into the conversation as the local client.
    fn publish(
        &self,
        client: &ClientHandle,
        conversation_id: &ConversationId,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;

    /// Start listening for messages created in the conversation.
    ///
    /// The stream yields every message, including the client's own echoes.
    fn subscribe(
        &self,
        client: &ClientHandle,
        conversation_id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<Subscription, TransportError>> + Send;

    /// Tear a subscription down. Best-effort: failures are only logged.
    fn unsubscribe(&self, subscription: Subscription) -> impl std::future::Future<Output = ()> + Send;
}
