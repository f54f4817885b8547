//! Broadcast bus distributing `ReplyEvent`s of one conversation.
//!
//! Built on `tokio::sync::broadcast`, the `ReplyBus` supports multiple
//! concurrent listeners. Publishing with no active listeners is a no-op.
//! In-process backends use it to fan `message_created` events out to
//! subscriptions.

use futures_util::stream;
use tokio::sync::broadcast;
use tracing::warn;

use mitra_types::transport::ReplyEvent;

use crate::transport::backend::ReplyStream;

/// Multi-consumer bus for conversation events.
///
/// Cloning the bus clones the sender, allowing multiple producers and
/// consumers.
pub struct ReplyBus {
    sender: broadcast::Sender<ReplyEvent>,
}

impl ReplyBus {
    /// Create a new bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a receiver that will see all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<ReplyEvent> {
        self.sender.subscribe()
    }

    /// Subscribe and adapt the receiver into a [`ReplyStream`].
    ///
    /// Lagged receivers skip the lost events; the stream ends when every
    /// sender has been dropped.
    pub fn stream(&self) -> ReplyStream {
        let rx = self.sender.subscribe();
        Box::pin(stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(event) => return Some((Ok(event), rx)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Reply listener lagged, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        }))
    }

    /// Publish an event to all current listeners.
    ///
    /// If there are no listeners, the event is silently dropped.
    pub fn publish(&self, event: ReplyEvent) {
        let _ = self.sender.send(event);
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Clone for ReplyBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl std::fmt::Debug for ReplyBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyBus")
            .field("listener_count", &self.sender.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use mitra_types::transport::{ConversationId, ParticipantId};

    fn sample_event(text: &str) -> ReplyEvent {
        ReplyEvent {
            message_id: format!("m-{text}"),
            conversation_id: ConversationId("conv".to_string()),
            user_id: ParticipantId("bot".to_string()),
            text: text.to_string(),
            created_at: None,
        }
    }

    #[tokio::test]
    async fn publish_and_subscribe_delivers_event() {
        let bus = ReplyBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(sample_event("hi"));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.text, "hi");
    }

    #[tokio::test]
    async fn stream_yields_events_in_order() {
        let bus = ReplyBus::new(16);
        let mut events = bus.stream();

        bus.publish(sample_event("one"));
        bus.publish(sample_event("two"));

        assert_eq!(events.next().await.unwrap().unwrap().text, "one");
        assert_eq!(events.next().await.unwrap().unwrap().text, "two");
    }

    #[tokio::test]
    async fn stream_ends_when_bus_dropped() {
        let bus = ReplyBus::new(16);
        let mut events = bus.stream();
        drop(bus);
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn lagged_stream_keeps_latest_events() {
        let bus = ReplyBus::new(2);
        let mut events = bus.stream();

        for i in 0..5 {
            bus.publish(sample_event(&i.to_string()));
        }

        // The first three were overwritten; the stream resumes at the oldest kept.
        assert_eq!(events.next().await.unwrap().unwrap().text, "3");
        assert_eq!(events.next().await.unwrap().unwrap().text, "4");
    }

    #[tokio::test]
    async fn publish_with_no_listeners_does_not_panic() {
        let bus = ReplyBus::new(16);
        bus.publish(sample_event("void"));
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn clone_shares_channel() {
        let bus = ReplyBus::new(16);
        let bus2 = bus.clone();
        let mut rx = bus.subscribe();

        bus2.publish(sample_event("shared"));

        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn debug_impl() {
        let bus = ReplyBus::new(16);
        let _rx = bus.subscribe();
        let debug = format!("{bus:?}");
        assert!(debug.contains("ReplyBus"));
        assert!(debug.contains("listener_count: 1"));
    }
}
