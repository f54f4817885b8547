//! Local responder backend.
//!
//! `MockChatBackend` answers without any network: every published message
//! is echoed back onto the conversation (as a real server would) and, after
//! a configurable delay, one canned markdown reply is published by the bot.
//! Each conversation gets its own [`ReplyBus`].

use std::time::Duration;

use dashmap::DashMap;
use rand::seq::SliceRandom;
use tracing::debug;
use uuid::Uuid;

use mitra_core::event::ReplyBus;
use mitra_core::transport::{ChatBackend, Subscription};
use mitra_types::error::TransportError;
use mitra_types::transport::{ClientHandle, ConversationId, ParticipantId, ReplyEvent};

/// Identity of the mock bot on every conversation.
pub const MOCK_BOT_ID: &str = "mitra-mock-bot";

const CANNED_REPLIES: &[&str] = &[
    "That's a great question! Here's what I can tell you:\n\n**Key points:**\n- Start with the official KIIT portal for the latest notices\n- Your department office can confirm anything time-sensitive\n\nWant me to go into more detail on any of these?",
    "### Quick answer\n\nIt depends on your semester, but here is the usual flow:\n\n1. Check the academic calendar\n2. Register on the student portal\n3. Confirm with your faculty advisor\n\n> Tip: deadlines are strict, so plan a few days ahead.",
    "Happy to help! A few things worth knowing:\n\n- *Library* hours are extended during exams\n- Labs can be booked through your department\n- The `KIIT Mitra` assistant is available any time\n\nIs there anything specific you're looking for?",
    "Here's a small example you can try:\n\n```\nfn main() {\n    println!(\"Hello, KIIT!\");\n}\n```\n\nRun it with `cargo run` and you should see the greeting printed.",
    "I understand. Let me break it down:\n\n## Overview\n\nMost campus services are split between **academic** and **administrative** offices.\n\n- Academic: courses, exams, results\n- Administrative: fees, hostel, ID cards\n\nWhich one does your question fall under?",
];

/// Offline chat backend with canned replies.
pub struct MockChatBackend {
    reply_delay: Duration,
    conversations: DashMap<ConversationId, ReplyBus>,
}

impl MockChatBackend {
    pub fn new(reply_delay: Duration) -> Self {
        Self {
            reply_delay,
            conversations: DashMap::new(),
        }
    }

    fn bus(&self, conversation_id: &ConversationId) -> Result<ReplyBus, TransportError> {
        self.conversations
            .get(conversation_id)
            .map(|bus| bus.clone())
            .ok_or_else(|| {
                TransportError::Backend(format!("unknown conversation '{conversation_id}'"))
            })
    }
}

impl Default for MockChatBackend {
    fn default() -> Self {
        Self::new(Duration::from_millis(800))
    }
}

fn pick_reply() -> String {
    let mut rng = rand::thread_rng();
    CANNED_REPLIES
        .choose(&mut rng)
        .copied()
        .unwrap_or("I'm here to help!")
        .to_string()
}

fn message_event(conversation_id: &ConversationId, author: &str, text: String) -> ReplyEvent {
    ReplyEvent {
        message_id: Uuid::now_v7().to_string(),
        conversation_id: conversation_id.clone(),
        user_id: ParticipantId(author.to_string()),
        text,
        created_at: Some(chrono::Utc::now()),
    }
}

impl ChatBackend for MockChatBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn connect(&self, endpoint_id: &str) -> Result<ClientHandle, TransportError> {
        Ok(ClientHandle {
            endpoint_id: endpoint_id.to_string(),
            user_id: ParticipantId(format!("mock-user-{}", Uuid::now_v7())),
        })
    }

    async fn create_conversation(
        &self,
        _client: &ClientHandle,
    ) -> Result<ConversationId, TransportError> {
        let conversation_id = ConversationId(format!("mock-conv-{}", Uuid::now_v7()));
        self.conversations
            .insert(conversation_id.clone(), ReplyBus::new(32));
        debug!(conversation_id = %conversation_id, "Mock conversation created");
        Ok(conversation_id)
    }

    async fn publish(
        &self,
        client: &ClientHandle,
        conversation_id: &ConversationId,
        text: &str,
    ) -> Result<(), TransportError> {
        let bus = self.bus(conversation_id)?;
        bus.publish(message_event(conversation_id, &client.user_id.0, text.to_string()));

        let reply = message_event(conversation_id, MOCK_BOT_ID, pick_reply());
        let delay = self.reply_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            bus.publish(reply);
        });
        Ok(())
    }

    async fn subscribe(
        &self,
        _client: &ClientHandle,
        conversation_id: &ConversationId,
    ) -> Result<Subscription, TransportError> {
        let bus = self.bus(conversation_id)?;
        Ok(Subscription::new(
            Uuid::now_v7().to_string(),
            conversation_id.clone(),
            bus.stream(),
        ))
    }

    async fn unsubscribe(&self, subscription: Subscription) {
        debug!(subscription_id = %subscription.id, "Mock subscription closed");
    }
}
