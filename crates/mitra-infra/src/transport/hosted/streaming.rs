//! Server-sent event listener for the hosted chat API.
//!
//! `GET /conversations/{id}/listen` keeps a long-lived SSE connection open.
//! Each event carries a JSON envelope `{"type": ..., "data": ...}`; only
//! `message_created` envelopes with a text or markdown payload become
//! [`ReplyEvent`]s. Everything else (pings, typing, malformed data) is skipped.

use futures_util::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use tracing::{debug, warn};

use mitra_core::transport::ReplyStream;
use mitra_types::error::TransportError;
use mitra_types::transport::{ConversationId, ParticipantId, ReplyEvent};

use super::client::status_error;
use super::types::{ListenEnvelope, WireMessage};

const MESSAGE_CREATED: &str = "message_created";

/// Open the listen stream for `conversation_id`.
///
/// Resolves once the server has accepted the SSE request, so anything
/// published afterwards is delivered on the returned stream. Dropping the
/// stream closes the connection. Non-success statuses fail the open, or end
/// the stream with an error later (401/403 as
/// [`TransportError::Unauthorized`]); the event source's own reconnect
/// logic is not used.
pub async fn open_listen_stream(
    request: reqwest::RequestBuilder,
    conversation_id: ConversationId,
) -> Result<ReplyStream, TransportError> {
    let mut source = EventSource::new(request)
        .map_err(|e| TransportError::Backend(format!("cannot open listen stream: {e}")))?;

    match source.next().await {
        Some(Ok(Event::Open)) => {
            debug!(conversation_id = %conversation_id, "Listen stream open");
        }
        Some(Ok(Event::Message(_))) => {
            source.close();
            return Err(TransportError::Backend(
                "listen stream sent data before opening".to_string(),
            ));
        }
        Some(Err(err)) => {
            source.close();
            return Err(listen_error(err));
        }
        None => {
            return Err(TransportError::Backend(
                "listen stream closed before opening".to_string(),
            ));
        }
    }

    Ok(listen_events(source, conversation_id))
}

fn listen_events(mut source: EventSource, conversation_id: ConversationId) -> ReplyStream {
    Box::pin(async_stream::try_stream! {
        while let Some(event) = source.next().await {
            match event {
                Ok(Event::Open) => {}
                Ok(Event::Message(message)) => {
                    if let Some(reply) = parse_listen_event(&message.event, &message.data) {
                        if reply.conversation_id == conversation_id {
                            yield reply;
                        }
                    }
                }
                Err(reqwest_eventsource::Error::StreamEnded) => {
                    debug!(conversation_id = %conversation_id, "Listen stream ended");
                    break;
                }
                Err(err) => {
                    source.close();
                    Err::<(), _>(listen_error(err))?;
                }
            }
        }
    })
}

fn listen_error(err: reqwest_eventsource::Error) -> TransportError {
    match err {
        reqwest_eventsource::Error::InvalidStatusCode(status, _) => {
            status_error(status, String::new())
        }
        reqwest_eventsource::Error::StreamEnded => {
            TransportError::Backend("listen stream ended".to_string())
        }
        other => TransportError::Backend(format!("listen stream failed: {other}")),
    }
}

/// Decode one SSE payload into a reply event.
///
/// `event_name` is the SSE `event:` field; servers that put the type there
/// instead of in the JSON envelope are handled too.
pub fn parse_listen_event(event_name: &str, data: &str) -> Option<ReplyEvent> {
    let envelope: ListenEnvelope = match serde_json::from_str(data) {
        Ok(envelope) => envelope,
        Err(err) => {
            if event_name == MESSAGE_CREATED {
                if let Ok(message) = serde_json::from_str::<WireMessage>(data) {
                    return into_reply(message);
                }
            }
            debug!("Skipping undecodable listen event: {err}");
            return None;
        }
    };

    if envelope.kind != MESSAGE_CREATED {
        return None;
    }

    match serde_json::from_value::<WireMessage>(envelope.data) {
        Ok(message) => into_reply(message),
        Err(err) => {
            warn!("Malformed message_created event: {err}");
            None
        }
    }
}

fn into_reply(message: WireMessage) -> Option<ReplyEvent> {
    let text = message.payload.into_text()?;
    Some(ReplyEvent {
        message_id: message.id,
        conversation_id: ConversationId(message.conversation_id),
        user_id: ParticipantId(message.user_id),
        text,
        created_at: message.created_at,
    })
}
