//! Conversation session: the message log and its send cycle.
//!
//! A `ConversationSession` is owned by exactly one chat view. It acquires the
//! transport handle once in [`ConversationSession::start`], then runs at most
//! one `Idle → Sending → AwaitingReply → Idle` cycle at a time.
//!
//! Sends come in two steps so the view stays responsive while a reply is in
//! flight:
//!
//! ```text
//! let ticket = session.begin_send(text)?;   // user message appended, Sending
//! let reply = session.dispatch(&ticket);    // AwaitingReply, session not borrowed
//! let result = reply.await;
//! session.finish_send(ticket, result);      // bot message or notice, Idle
//! ```
//!
//! `reset()` bumps an epoch. Tickets from an older epoch finish as
//! [`SendOutcome::Discarded`] and never touch the new log.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use mitra_types::chat::{ChatPhase, DEFAULT_GREETING, Message, Notice};
use mitra_types::error::{ChatError, TransportError};
use mitra_types::transport::{BotReply, TransportHandle};

use crate::auth::AuthProvider;
use crate::transport::TransportAdapter;

/// Why a send request was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The text was empty after trimming.
    EmptyInput,
    /// A previous send is still waiting for its reply.
    Busy,
    /// `start()` has not acquired a transport handle yet.
    NotStarted,
}

/// Result of one completed send cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Ignored(IgnoreReason),
    /// The bot answered; the message was appended to the log.
    Replied(Message),
    /// The send failed; the session is back to `Idle`.
    Failed(Notice),
    /// The log was reset while the reply was in flight.
    Discarded,
}

/// An accepted send, waiting to be dispatched and finished.
#[derive(Debug)]
pub struct SendTicket {
    epoch: u64,
    text: String,
    handle: TransportHandle,
}

impl SendTicket {
    /// The trimmed text that was appended as the user message.
    pub fn text(&self) -> &str {
        &self.text
    }
}

pub struct ConversationSession<A: AuthProvider> {
    auth: A,
    adapter: Arc<TransportAdapter>,
    endpoint_id: String,
    greeting: String,
    messages: Vec<Message>,
    phase: ChatPhase,
    input: String,
    handle: Option<TransportHandle>,
    epoch: u64,
    turns: u32,
    started_at: Option<DateTime<Utc>>,
}

impl<A: AuthProvider> ConversationSession<A> {
    pub fn new(auth: A, adapter: Arc<TransportAdapter>, endpoint_id: impl Into<String>) -> Self {
        Self {
            auth,
            adapter,
            endpoint_id: endpoint_id.into(),
            greeting: DEFAULT_GREETING.to_string(),
            messages: Vec::new(),
            phase: ChatPhase::Idle,
            input: String::new(),
            handle: None,
            epoch: 0,
            turns: 0,
            started_at: None,
        }
    }

    /// Replace the canned greeting text.
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// Seed the greeting and open the conversation.
    ///
    /// Idempotent: a second call neither reseeds the log nor reconnects. If
    /// opening the conversation fails the greeting stays and a later call
    /// retries the connection.
    pub async fn start(&mut self) -> Result<(), ChatError> {
        if !self.auth.is_authenticated() {
            return Err(ChatError::NotAuthenticated);
        }

        if self.started_at.is_none() {
            let now = Utc::now();
            self.started_at = Some(now);
            self.messages = vec![Message::greeting(self.greeting.clone(), now)];
        }

        if self.handle.is_none() {
            let handle = self.adapter.open(&self.endpoint_id).await?;
            self.handle = Some(handle);
        }
        Ok(())
    }

    /// Accept a send: append the user message and enter `Sending`.
    pub fn begin_send(&mut self, text: &str) -> Result<SendTicket, IgnoreReason> {
        let text = text.trim();
        if text.is_empty() {
            return Err(IgnoreReason::EmptyInput);
        }
        if self.phase != ChatPhase::Idle {
            debug!(phase = %self.phase, "Send rejected while a reply is pending");
            return Err(IgnoreReason::Busy);
        }
        let Some(handle) = self.handle.clone() else {
            return Err(IgnoreReason::NotStarted);
        };

        self.messages.push(Message::user(text));
        self.input.clear();
        self.phase = ChatPhase::Sending;

        Ok(SendTicket {
            epoch: self.epoch,
            text: text.to_string(),
            handle,
        })
    }

    /// Hand the ticket to the transport and enter `AwaitingReply`.
    ///
    /// The returned future does not borrow the session.
    pub fn dispatch(
        &mut self,
        ticket: &SendTicket,
    ) -> impl Future<Output = Result<BotReply, TransportError>> + Send + use<A> {
        if ticket.epoch == self.epoch {
            self.phase = ChatPhase::AwaitingReply;
        }
        let adapter = Arc::clone(&self.adapter);
        let handle = ticket.handle.clone();
        let text = ticket.text.clone();
        async move { adapter.send_and_await_reply(&handle, &text).await }
    }

    /// Apply the transport result of a ticket and return to `Idle`.
    pub fn finish_send(
        &mut self,
        ticket: SendTicket,
        result: Result<BotReply, TransportError>,
    ) -> SendOutcome {
        if ticket.epoch != self.epoch {
            debug!(
                ticket_epoch = ticket.epoch,
                epoch = self.epoch,
                "Discarding reply for a reset conversation"
            );
            return SendOutcome::Discarded;
        }

        self.phase = ChatPhase::Idle;
        match result {
            Ok(reply) => {
                let message = Message::bot(reply.text, reply.created_at);
                self.messages.push(message.clone());
                self.turns += 1;
                SendOutcome::Replied(message)
            }
            Err(err) => {
                warn!(error = %err, "Send failed");
                SendOutcome::Failed(Notice::from(&err))
            }
        }
    }

    /// One complete send cycle.
    pub async fn send(&mut self, text: &str) -> SendOutcome {
        let ticket = match self.begin_send(text) {
            Ok(ticket) => ticket,
            Err(reason) => return SendOutcome::Ignored(reason),
        };
        let result = self.dispatch(&ticket).await;
        self.finish_send(ticket, result)
    }

    /// Send the current input buffer.
    pub async fn send_input(&mut self) -> SendOutcome {
        let text = self.input.clone();
        self.send(&text).await
    }

    /// Start a fresh conversation log on the same transport handle.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.messages = vec![Message::greeting(self.greeting.clone(), Utc::now())];
        self.input.clear();
        self.phase = ChatPhase::Idle;
        self.turns = 0;
        info!(epoch = self.epoch, "Conversation reset");
    }

    /// Tear the session down and hand back its final log.
    pub fn end(self) -> Vec<Message> {
        info!(
            turns = self.turns,
            messages = self.messages.len(),
            "Conversation ended"
        );
        self.messages
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The last `limit` messages.
    pub fn history(&self, limit: usize) -> &[Message] {
        let skip = self.messages.len().saturating_sub(limit);
        &self.messages[skip..]
    }

    pub fn phase(&self) -> ChatPhase {
        self.phase
    }

    pub fn is_typing(&self) -> bool {
        self.phase.is_typing()
    }

    pub fn is_started(&self) -> bool {
        self.handle.is_some()
    }

    /// Whether the send control should be enabled.
    pub fn can_send(&self) -> bool {
        self.phase == ChatPhase::Idle && self.handle.is_some()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Completed user/bot exchanges since the last reset.
    pub fn turn_count(&self) -> u32 {
        self.turns
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn handle(&self) -> Option<&TransportHandle> {
        self.handle.as_ref()
    }
}
