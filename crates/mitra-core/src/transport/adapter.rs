//! Send one message and wait for exactly one bot reply.
//!
//! The adapter owns the type-erased backend and the reply timeout. Each call
//! opens a one-shot subscription, publishes, and waits for the first
//! non-echo `message_created` event. One deadline covers all three steps, so
//! a hung subscribe or publish fails the same way a silent bot does. The
//! subscription is torn down on every exit path, so a reply that arrives
//! after the timeout is never observed.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use mitra_types::error::TransportError;
use mitra_types::transport::{BotReply, ConversationId, ParticipantId, TransportHandle};

use super::backend::ReplyStream;
use super::box_backend::BoxChatBackend;

/// How long a send waits for the bot before giving up.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(30);

pub struct TransportAdapter {
    backend: BoxChatBackend,
    reply_timeout: Duration,
}

impl TransportAdapter {
    pub fn new(backend: BoxChatBackend) -> Self {
        Self {
            backend,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }

    pub fn with_reply_timeout(mut self, reply_timeout: Duration) -> Self {
        self.reply_timeout = reply_timeout;
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn reply_timeout(&self) -> Duration {
        self.reply_timeout
    }

    /// Connect to the endpoint and open a conversation.
    ///
    /// Called once per session; the returned handle is reused for every send.
    pub async fn open(&self, endpoint_id: &str) -> Result<TransportHandle, TransportError> {
        let client = self.backend.connect(endpoint_id).await?;
        let conversation_id = self.backend.create_conversation(&client).await?;
        info!(
            backend = self.backend.name(),
            conversation_id = %conversation_id,
            user_id = %client.user_id,
            "Conversation opened"
        );
        Ok(TransportHandle {
            client,
            conversation_id,
        })
    }

    /// Publish `text` and wait for the bot's answer.
    ///
    /// Echoes of the client's own message are skipped. Fails with
    /// [`TransportError::Timeout`] when subscribing, publishing and the
    /// reply together take longer than the reply timeout.
    pub async fn send_and_await_reply(
        &self,
        handle: &TransportHandle,
        text: &str,
    ) -> Result<BotReply, TransportError> {
        let deadline = Instant::now() + self.reply_timeout;

        // Listen before publishing so a fast reply cannot slip past.
        let subscribed = timeout_at(
            deadline,
            self.backend
                .subscribe(&handle.client, &handle.conversation_id),
        )
        .await;
        let mut subscription = match subscribed {
            Ok(subscription) => subscription?,
            Err(_) => return Err(self.timed_out(handle, "subscribe")),
        };

        let published = timeout_at(
            deadline,
            self.backend
                .publish(&handle.client, &handle.conversation_id, text),
        )
        .await;
        let outcome = match published {
            Ok(Ok(())) => {
                let waited = timeout_at(
                    deadline,
                    next_reply(
                        &mut subscription.events,
                        &handle.conversation_id,
                        &handle.client.user_id,
                    ),
                )
                .await;
                waited.unwrap_or_else(|_| Err(self.timed_out(handle, "reply")))
            }
            Ok(Err(err)) => Err(err),
            Err(_) => Err(self.timed_out(handle, "publish")),
        };

        self.backend.unsubscribe(subscription).await;
        outcome
    }

    fn timed_out(&self, handle: &TransportHandle, stage: &'static str) -> TransportError {
        warn!(
            conversation_id = %handle.conversation_id,
            stage,
            timeout_secs = self.reply_timeout.as_secs_f64(),
            "No reply from bot before timeout"
        );
        TransportError::Timeout(self.reply_timeout)
    }
}

/// First event on the conversation authored by someone other than `own_id`.
async fn next_reply(
    events: &mut ReplyStream,
    conversation_id: &ConversationId,
    own_id: &ParticipantId,
) -> Result<BotReply, TransportError> {
    while let Some(event) = events.next().await {
        let event = event?;
        if &event.conversation_id != conversation_id {
            continue;
        }
        if &event.user_id == own_id {
            debug!(message_id = %event.message_id, "Skipping echo of own message");
            continue;
        }
        return Ok(event.into());
    }
    Err(TransportError::Backend(
        "subscription closed before a reply arrived".to_string(),
    ))
}
