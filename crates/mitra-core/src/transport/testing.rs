//! In-process backend used by the core's unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mitra_types::error::TransportError;
use mitra_types::transport::{ClientHandle, ConversationId, ParticipantId, ReplyEvent};

use crate::event::ReplyBus;

use super::backend::{ChatBackend, Subscription};

pub(crate) const CLIENT_ID: &str = "client-1";
pub(crate) const BOT_ID: &str = "bot-1";

#[derive(Debug, Clone)]
pub(crate) enum Behavior {
    /// Echo the user's message, then answer `re: {text}` after `delay`.
    Reply { delay: Duration },
    /// Echo only; the bot never answers.
    Silent,
    /// Reject every publish with this error.
    RejectPublish(TransportError),
    /// Publish never completes.
    HangPublish,
    /// Subscribe never completes.
    HangSubscribe,
}

pub(crate) struct FakeState {
    pub bus: ReplyBus,
    pub connects: AtomicUsize,
    pub conversations: AtomicUsize,
    pub unsubscribes: AtomicUsize,
    pub published: Mutex<Vec<String>>,
    behavior: Mutex<Behavior>,
}

impl FakeState {
    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }
}

pub(crate) struct FakeBackend {
    state: Arc<FakeState>,
}

impl FakeBackend {
    pub fn new(behavior: Behavior) -> (Self, Arc<FakeState>) {
        let state = Arc::new(FakeState {
            bus: ReplyBus::new(16),
            connects: AtomicUsize::new(0),
            conversations: AtomicUsize::new(0),
            unsubscribes: AtomicUsize::new(0),
            published: Mutex::new(Vec::new()),
            behavior: Mutex::new(behavior),
        });
        (
            Self {
                state: Arc::clone(&state),
            },
            state,
        )
    }
}

fn event(conversation_id: &ConversationId, author: &str, text: String) -> ReplyEvent {
    ReplyEvent {
        message_id: format!("{author}-{text}"),
        conversation_id: conversation_id.clone(),
        user_id: ParticipantId(author.to_string()),
        text,
        created_at: None,
    }
}

impl ChatBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    async fn connect(&self, endpoint_id: &str) -> Result<ClientHandle, TransportError> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        Ok(ClientHandle {
            endpoint_id: endpoint_id.to_string(),
            user_id: ParticipantId(CLIENT_ID.to_string()),
        })
    }

    async fn create_conversation(
        &self,
        _client: &ClientHandle,
    ) -> Result<ConversationId, TransportError> {
        let n = self.state.conversations.fetch_add(1, Ordering::SeqCst);
        Ok(ConversationId(format!("conv-{n}")))
    }

    async fn publish(
        &self,
        _client: &ClientHandle,
        conversation_id: &ConversationId,
        text: &str,
    ) -> Result<(), TransportError> {
        let behavior = self.state.behavior.lock().unwrap().clone();
        match &behavior {
            Behavior::RejectPublish(err) => return Err(err.clone()),
            Behavior::HangPublish => std::future::pending::<()>().await,
            _ => {}
        }

        self.state.published.lock().unwrap().push(text.to_string());
        self.state
            .bus
            .publish(event(conversation_id, CLIENT_ID, text.to_string()));

        if let Behavior::Reply { delay } = behavior {
            let bus = self.state.bus.clone();
            let reply = event(conversation_id, BOT_ID, format!("re: {text}"));
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                bus.publish(reply);
            });
        }
        Ok(())
    }

    async fn subscribe(
        &self,
        _client: &ClientHandle,
        conversation_id: &ConversationId,
    ) -> Result<Subscription, TransportError> {
        let hangs = matches!(*self.state.behavior.lock().unwrap(), Behavior::HangSubscribe);
        if hangs {
            std::future::pending::<()>().await;
        }
        Ok(Subscription::new(
            "sub",
            conversation_id.clone(),
            self.state.bus.stream(),
        ))
    }

    async fn unsubscribe(&self, _subscription: Subscription) {
        self.state.unsubscribes.fetch_add(1, Ordering::SeqCst);
    }
}
