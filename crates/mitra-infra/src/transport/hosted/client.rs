//! HostedChatBackend -- concrete [`ChatBackend`] for the hosted chat API.
//!
//! Every endpoint lives under `{base_url}/{webhook_id}`. `POST /users`
//! issues a user id plus a user key; the key authenticates every later call
//! through the `x-user-key` header.
//!
//! User keys are held as [`secrecy::SecretString`] inside the backend, keyed
//! by participant id, and are only exposed when building request headers.

use std::time::Duration;

use dashmap::DashMap;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use mitra_core::transport::{ChatBackend, Subscription};
use mitra_types::error::TransportError;
use mitra_types::transport::{ClientHandle, ConversationId, ParticipantId};

use super::streaming::open_listen_stream;
use super::types::{
    CreateConversationResponse, CreateMessageRequest, CreateUserResponse, EmptyBody, TextPayload,
};

const USER_KEY_HEADER: &str = "x-user-key";

/// Upper bound for one JSON request. The listen stream has none.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Hosted chat API backend.
///
/// Does not derive `Debug`: it holds user keys.
pub struct HostedChatBackend {
    client: reqwest::Client,
    base_url: String,
    user_keys: DashMap<ParticipantId, SecretString>,
}

impl HostedChatBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TransportError::Backend(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_keys: DashMap::new(),
        })
    }

    fn url(&self, endpoint_id: &str, path: &str) -> String {
        format!("{}/{}{}", self.base_url, endpoint_id, path)
    }

    /// Attach the client's user key. A client this backend never connected
    /// has no key and is treated as unauthorized.
    fn authed(
        &self,
        request: reqwest::RequestBuilder,
        client: &ClientHandle,
    ) -> Result<reqwest::RequestBuilder, TransportError> {
        let key = self
            .user_keys
            .get(&client.user_id)
            .ok_or(TransportError::Unauthorized)?;
        Ok(request.header(USER_KEY_HEADER, key.expose_secret()))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, TransportError> {
        let response = send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| TransportError::Backend(format!("failed to parse response: {e}")))
    }
}

async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response, TransportError> {
    let response = request
        .timeout(REQUEST_TIMEOUT)
        .send()
        .await
        .map_err(|e| TransportError::Backend(format!("HTTP request failed: {e}")))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, body))
}

/// Map a non-success status to a transport error.
pub(super) fn status_error(status: StatusCode, body: String) -> TransportError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TransportError::Unauthorized,
        _ if body.trim().is_empty() => TransportError::Backend(format!("HTTP {status}")),
        _ => TransportError::Backend(format!("HTTP {status}: {}", body.trim())),
    }
}

impl ChatBackend for HostedChatBackend {
    fn name(&self) -> &str {
        "hosted"
    }

    async fn connect(&self, endpoint_id: &str) -> Result<ClientHandle, TransportError> {
        let request = self
            .client
            .post(self.url(endpoint_id, "/users"))
            .json(&EmptyBody {});
        let created: CreateUserResponse = self.send_json(request).await?;

        let user_id = ParticipantId(created.user.id);
        self.user_keys
            .insert(user_id.clone(), SecretString::from(created.key));
        debug!(user_id = %user_id, "Hosted chat user created");

        Ok(ClientHandle {
            endpoint_id: endpoint_id.to_string(),
            user_id,
        })
    }

    async fn create_conversation(
        &self,
        client: &ClientHandle,
    ) -> Result<ConversationId, TransportError> {
        let request = self.authed(
            self.client
                .post(self.url(&client.endpoint_id, "/conversations"))
                .json(&EmptyBody {}),
            client,
        )?;
        let created: CreateConversationResponse = self.send_json(request).await?;
        Ok(ConversationId(created.conversation.id))
    }

    async fn publish(
        &self,
        client: &ClientHandle,
        conversation_id: &ConversationId,
        text: &str,
    ) -> Result<(), TransportError> {
        let body = CreateMessageRequest {
            conversation_id: &conversation_id.0,
            payload: TextPayload::new(text),
        };
        let request = self.authed(
            self.client
                .post(self.url(&client.endpoint_id, "/messages"))
                .json(&body),
            client,
        )?;
        send(request).await?;
        Ok(())
    }

    async fn subscribe(
        &self,
        client: &ClientHandle,
        conversation_id: &ConversationId,
    ) -> Result<Subscription, TransportError> {
        let path = format!("/conversations/{}/listen", conversation_id.0);
        let request = self.authed(self.client.get(self.url(&client.endpoint_id, &path)), client)?;
        let events = open_listen_stream(request, conversation_id.clone()).await?;
        Ok(Subscription::new(
            Uuid::now_v7().to_string(),
            conversation_id.clone(),
            events,
        ))
    }

    async fn unsubscribe(&self, subscription: Subscription) {
        // Dropping the stream closes the SSE connection.
        debug!(
            subscription_id = %subscription.id,
            conversation_id = %subscription.conversation_id,
            "Listen subscription closed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use futures_util::StreamExt;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::Notify;
    use tokio::task::JoinHandle;

    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).into_owned();
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        if name.eq_ignore_ascii_case("content-length") {
                            value.trim().parse::<usize>().ok()
                        } else {
                            None
                        }
                    })
                    .unwrap_or(0);
                if buf.len() >= head_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Serve one canned response per connection, returning the raw requests.
    async fn stub_server(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().await.unwrap();
                requests.push(read_request(&mut stream).await);
                let reason = if status == 200 { "OK" } else { "Error" };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
            }
            requests
        });
        (base_url, handle)
    }

    /// Route requests by path: JSON for the POSTs and a held-open SSE
    /// response for `listen`, which emits one bot message after the first
    /// `POST /messages`. Returns request lines in arrival order.
    async fn listen_server(listen_status: u16) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let log = Arc::new(Mutex::new(Vec::new()));
        let published = Arc::new(Notify::new());

        let requests = Arc::clone(&log);
        tokio::spawn(async move {
            loop {
                let (mut stream, _) = listener.accept().await.unwrap();
                let requests = Arc::clone(&requests);
                let published = Arc::clone(&published);
                tokio::spawn(async move {
                    let request = read_request(&mut stream).await;
                    let line = request.lines().next().unwrap_or_default().to_string();
                    requests.lock().unwrap().push(line.clone());

                    if line.starts_with("GET ") && listen_status == 200 {
                        stream
                            .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ncache-control: no-cache\r\n\r\n")
                            .await
                            .unwrap();
                        stream.flush().await.unwrap();
                        published.notified().await;
                        let event = r#"data: {"type":"message_created","data":{"id":"msg_2","conversationId":"conv_1","userId":"bot_user","payload":{"type":"text","text":"Hi there"}}}"#;
                        stream.write_all(format!("{event}\n\n").as_bytes()).await.unwrap();
                        stream.flush().await.unwrap();
                        tokio::time::sleep(Duration::from_secs(5)).await;
                        return;
                    }

                    let (status, body) = if line.starts_with("GET ") {
                        (listen_status, r#"{"message":"Unauthorized"}"#)
                    } else if line.starts_with("POST /hook/users ") {
                        (200, r#"{"user":{"id":"user_1"},"key":"k-123"}"#)
                    } else if line.starts_with("POST /hook/conversations ") {
                        (200, r#"{"conversation":{"id":"conv_1"}}"#)
                    } else {
                        published.notify_one();
                        (200, r#"{"message":{"id":"msg_1"}}"#)
                    };
                    let reason = if status == 200 { "OK" } else { "Error" };
                    let response = format!(
                        "HTTP/1.1 {status} {reason}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    stream.write_all(response.as_bytes()).await.unwrap();
                    stream.shutdown().await.unwrap();
                });
            }
        });
        (base_url, log)
    }

    #[tokio::test]
    async fn subscribe_returns_once_listen_is_accepted() {
        let (base_url, log) = listen_server(200).await;
        let backend = HostedChatBackend::new(base_url).unwrap();
        let client = backend.connect("hook").await.unwrap();
        let conversation = backend.create_conversation(&client).await.unwrap();

        let mut subscription = backend.subscribe(&client, &conversation).await.unwrap();
        let listen_line = "GET /hook/conversations/conv_1/listen ";
        assert!(log.lock().unwrap().iter().any(|line| line.starts_with(listen_line)));

        backend.publish(&client, &conversation, "hello").await.unwrap();
        let lines = log.lock().unwrap().clone();
        let listen_at = lines.iter().position(|l| l.starts_with(listen_line)).unwrap();
        let publish_at = lines.iter().position(|l| l.starts_with("POST /hook/messages ")).unwrap();
        assert!(listen_at < publish_at);

        let reply = tokio::time::timeout(Duration::from_secs(5), subscription.events.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(reply.text, "Hi there");
        assert_eq!(reply.conversation_id, conversation);
        backend.unsubscribe(subscription).await;
    }

    #[tokio::test]
    async fn rejected_listen_fails_subscribe() {
        let (base_url, _log) = listen_server(401).await;
        let backend = HostedChatBackend::new(base_url).unwrap();
        let client = backend.connect("hook").await.unwrap();
        let conversation = backend.create_conversation(&client).await.unwrap();

        let err = backend.subscribe(&client, &conversation).await.err().unwrap();
        assert_eq!(err, TransportError::Unauthorized);
    }

    #[tokio::test]
    async fn connect_create_and_publish() {
        let (base_url, server) = stub_server(vec![
            (200, r#"{"user":{"id":"user_1"},"key":"k-123"}"#),
            (200, r#"{"conversation":{"id":"conv_1"}}"#),
            (200, r#"{"message":{"id":"msg_1"}}"#),
        ])
        .await;

        let backend = HostedChatBackend::new(format!("{base_url}/")).unwrap();
        let client = backend.connect("hook").await.unwrap();
        assert_eq!(client.user_id.0, "user_1");

        let conversation = backend.create_conversation(&client).await.unwrap();
        assert_eq!(conversation.0, "conv_1");

        backend.publish(&client, &conversation, "hello").await.unwrap();

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("POST /hook/users "));
        assert!(requests[1].starts_with("POST /hook/conversations "));
        assert!(requests[1].to_lowercase().contains("x-user-key: k-123"));
        assert!(requests[2].starts_with("POST /hook/messages "));
        assert!(requests[2].contains(r#""conversationId":"conv_1""#));
        assert!(requests[2].contains(r#""text":"hello""#));
    }

    #[tokio::test]
    async fn unauthorized_status_maps_to_unauthorized() {
        let (base_url, _server) = stub_server(vec![
            (200, r#"{"user":{"id":"user_1"},"key":"k"}"#),
            (401, r#"{"message":"Unauthorized"}"#),
        ])
        .await;

        let backend = HostedChatBackend::new(base_url).unwrap();
        let client = backend.connect("hook").await.unwrap();
        let err = backend.create_conversation(&client).await.unwrap_err();
        assert_eq!(err, TransportError::Unauthorized);
    }

    #[tokio::test]
    async fn unknown_client_is_unauthorized() {
        let backend = HostedChatBackend::new("http://127.0.0.1:9").unwrap();
        let stranger = ClientHandle {
            endpoint_id: "hook".to_string(),
            user_id: ParticipantId("never-connected".to_string()),
        };
        let err = backend.create_conversation(&stranger).await.unwrap_err();
        assert_eq!(err, TransportError::Unauthorized);
    }

    #[test]
    fn status_error_mapping() {
        assert_eq!(
            status_error(StatusCode::FORBIDDEN, String::new()),
            TransportError::Unauthorized
        );
        assert_eq!(
            status_error(StatusCode::BAD_GATEWAY, "  ".to_string()),
            TransportError::Backend("HTTP 502 Bad Gateway".to_string())
        );
        assert_eq!(
            status_error(StatusCode::NOT_FOUND, "no such webhook\n".to_string()),
            TransportError::Backend("HTTP 404 Not Found: no such webhook".to_string())
        );
    }

    #[test]
    fn urls_are_scoped_to_webhook() {
        let backend = HostedChatBackend::new("https://chat.example.com///").unwrap();
        assert_eq!(
            backend.url("abc", "/conversations/c1/listen"),
            "https://chat.example.com/abc/conversations/c1/listen"
        );
    }
}
