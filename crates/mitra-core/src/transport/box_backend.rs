//! BoxChatBackend -- object-safe dynamic dispatch wrapper for ChatBackend.
//!
//! 1. Define an object-safe `ChatBackendDyn` trait with boxed futures
//! 2. Blanket-impl `ChatBackendDyn` for all `T: ChatBackend`
//! 3. `BoxChatBackend` wraps `Box<dyn ChatBackendDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use mitra_types::error::TransportError;
use mitra_types::transport::{ClientHandle, ConversationId};

use super::backend::{ChatBackend, Subscription};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe version of [`ChatBackend`] with boxed futures.
pub trait ChatBackendDyn: Send + Sync {
    fn name(&self) -> &str;

    fn connect_boxed<'a>(
        &'a self,
        endpoint_id: &'a str,
    ) -> BoxFuture<'a, Result<ClientHandle, TransportError>>;

    fn create_conversation_boxed<'a>(
        &'a self,
        client: &'a ClientHandle,
    ) -> BoxFuture<'a, Result<ConversationId, TransportError>>;

    fn publish_boxed<'a>(
        &'a self,
        client: &'a ClientHandle,
        conversation_id: &'a ConversationId,
        text: &'a str,
    ) -> BoxFuture<'a, Result<(), TransportError>>;

    fn subscribe_boxed<'a>(
        &'a self,
        client: &'a ClientHandle,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<Subscription, TransportError>>;

    fn unsubscribe_boxed(&self, subscription: Subscription) -> BoxFuture<'_, ()>;
}

/// Blanket implementation: any `ChatBackend` automatically implements `ChatBackendDyn`.
impl<T: ChatBackend> ChatBackendDyn for T {
    fn name(&self) -> &str {
        ChatBackend::name(self)
    }

    fn connect_boxed<'a>(
        &'a self,
        endpoint_id: &'a str,
    ) -> BoxFuture<'a, Result<ClientHandle, TransportError>> {
        Box::pin(self.connect(endpoint_id))
    }

    fn create_conversation_boxed<'a>(
        &'a self,
        client: &'a ClientHandle,
    ) -> BoxFuture<'a, Result<ConversationId, TransportError>> {
        Box::pin(self.create_conversation(client))
    }

    fn publish_boxed<'a>(
        &'a self,
        client: &'a ClientHandle,
        conversation_id: &'a ConversationId,
        text: &'a str,
    ) -> BoxFuture<'a, Result<(), TransportError>> {
        Box::pin(self.publish(client, conversation_id, text))
    }

    fn subscribe_boxed<'a>(
        &'a self,
        client: &'a ClientHandle,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<Subscription, TransportError>> {
        Box::pin(self.subscribe(client, conversation_id))
    }

    fn unsubscribe_boxed(&self, subscription: Subscription) -> BoxFuture<'_, ()> {
        Box::pin(self.unsubscribe(subscription))
    }
}

/// Type-erased chat backend for runtime backend selection.
///
/// Since `ChatBackend` uses RPITIT, it cannot be used as a trait object
/// directly. `BoxChatBackend` provides equivalent methods that delegate to
/// the inner `ChatBackendDyn` trait object.
pub struct BoxChatBackend {
    inner: Box<dyn ChatBackendDyn + Send + Sync>,
}

impl BoxChatBackend {
    /// Wrap a concrete `ChatBackend` in a type-erased box.
    pub fn new<T: ChatBackend + 'static>(backend: T) -> Self {
        Self {
            inner: Box::new(backend),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn connect(&self, endpoint_id: &str) -> Result<ClientHandle, TransportError> {
        self.inner.connect_boxed(endpoint_id).await
    }

    pub async fn create_conversation(
        &self,
        client: &ClientHandle,
    ) -> Result<ConversationId, TransportError> {
        self.inner.create_conversation_boxed(client).await
    }

    pub async fn publish(
        &self,
        client: &ClientHandle,
        conversation_id: &ConversationId,
        text: &str,
    ) -> Result<(), TransportError> {
        self.inner.publish_boxed(client, conversation_id, text).await
    }

    pub async fn subscribe(
        &self,
        client: &ClientHandle,
        conversation_id: &ConversationId,
    ) -> Result<Subscription, TransportError> {
        self.inner.subscribe_boxed(client, conversation_id).await
    }

    pub async fn unsubscribe(&self, subscription: Subscription) {
        self.inner.unsubscribe_boxed(subscription).await
    }
}
