//! WebSocket hub client with automatic reconnection.
//!
//! A session is a pair of tasks mirroring the server side: a writer draining
//! the outbound channel into the socket and a reader parsing [`ServerEvent`]
//! frames and dispatching them to the handler registry. A supervisor task
//! watches the session and, on unexpected loss, walks the
//! [`ReconnectPolicy`] schedule until the connection is back or the attempt
//! budget is spent.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use formpulse_shared::protocol::{
    ClientInvocation, CommentAddedEvent, ConnectedEvent, ErrorEvent, EventKind, JoinedTemplateEvent,
    LikeResultEvent, LikeToggledEvent, NewCommentEvent, ServerEvent, TemplateActivityEvent,
    UserJoinedEvent, UserLeftEvent,
};

use crate::{
    backoff::ReconnectPolicy,
    error::ClientError,
    subscription::{HandlerRegistry, Subscription},
};

/// Where the client currently stands with the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

type Hook = Arc<dyn Fn() + Send + Sync>;

/// Client handle for one hub endpoint.
///
/// Cheap to clone; clones share the connection, state and subscriptions.
#[derive(Clone)]
pub struct HubClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    endpoint: String,
    policy: ReconnectPolicy,
    handlers: HandlerRegistry,
    state: Mutex<ConnectionState>,
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    /// Set by an intentional `disconnect`; suppresses reconnection.
    closing: AtomicBool,
    reconnected_hooks: Mutex<Vec<Hook>>,
    disconnected_hooks: Mutex<Vec<Hook>>,
}

impl HubClient {
    /// Build a client for the given `ws://` endpoint. The access token, when
    /// present, is carried as the `access_token` query parameter and
    /// validated once per connection at the handshake.
    pub fn new(endpoint: &str, access_token: Option<&str>) -> Self {
        Self::with_policy(endpoint, access_token, ReconnectPolicy::default())
    }

    pub fn with_policy(
        endpoint: &str,
        access_token: Option<&str>,
        policy: ReconnectPolicy,
    ) -> Self {
        let endpoint = match access_token {
            Some(token) => format!("{}?access_token={}", endpoint, token),
            None => endpoint.to_string(),
        };
        Self {
            inner: Arc::new(ClientInner {
                endpoint,
                policy,
                handlers: HandlerRegistry::new(),
                state: Mutex::new(ConnectionState::Disconnected),
                outbound: Mutex::new(None),
                closing: AtomicBool::new(false),
                reconnected_hooks: Mutex::new(Vec::new()),
                disconnected_hooks: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.lock().expect("client state lock poisoned")
    }

    /// Establish the connection and start the supervisor.
    ///
    /// Returns `false` when the initial connect fails; reconnection only
    /// covers a connection that was lost after being established. While a
    /// connect or reconnect is already in flight this is a no-op returning
    /// `false`, so at most one supervisor ever owns the session.
    pub async fn connect(&self) -> bool {
        match self.state() {
            ConnectionState::Connected => return true,
            ConnectionState::Connecting | ConnectionState::Reconnecting => return false,
            ConnectionState::Disconnected => {}
        }
        self.inner.closing.store(false, Ordering::SeqCst);
        self.inner.set_state(ConnectionState::Connecting);

        match self.inner.open_session().await {
            Ok(session) => {
                let inner = self.inner.clone();
                tokio::spawn(async move {
                    inner.supervise(session).await;
                });
                true
            }
            Err(e) => {
                tracing::warn!("Failed to connect to {}: {}", self.inner.endpoint, e);
                self.inner.set_state(ConnectionState::Disconnected);
                false
            }
        }
    }

    /// Intentional shutdown: closes the socket and suppresses reconnection.
    pub fn disconnect(&self) {
        self.inner.closing.store(true, Ordering::SeqCst);
        self.inner
            .outbound
            .lock()
            .expect("client outbound lock poisoned")
            .take();
    }

    /// Send one invocation to the hub.
    ///
    /// Fails fast with [`ClientError::NotConnected`] while disconnected or
    /// reconnecting; nothing is queued for later delivery.
    pub fn invoke(&self, invocation: &ClientInvocation) -> Result<(), ClientError> {
        if self.state() != ConnectionState::Connected {
            return Err(ClientError::NotConnected);
        }
        let json =
            serde_json::to_string(invocation).map_err(|e| ClientError::Protocol(e.to_string()))?;
        let outbound = self
            .inner
            .outbound
            .lock()
            .expect("client outbound lock poisoned");
        match outbound.as_ref() {
            Some(tx) if tx.send(json).is_ok() => Ok(()),
            _ => Err(ClientError::NotConnected),
        }
    }

    /// Register a handler for one event kind.
    pub fn on(
        &self,
        kind: EventKind,
        handler: impl Fn(&ServerEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.handlers.on(kind, handler)
    }

    /// Drop every handler for the given kind.
    pub fn off(&self, kind: EventKind) {
        self.inner.handlers.clear(kind);
    }

    /// Runs after every successful reconnect. Group membership is not
    /// restored by the transport; a hook re-issues the join.
    pub fn on_reconnected(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.inner
            .reconnected_hooks
            .lock()
            .expect("client hooks lock poisoned")
            .push(Arc::new(hook));
    }

    /// Runs when the client lands in terminal `Disconnected`, whether by
    /// intent or by exhausting the reconnect budget.
    pub fn on_disconnected(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.inner
            .disconnected_hooks
            .lock()
            .expect("client hooks lock poisoned")
            .push(Arc::new(hook));
    }
}

macro_rules! typed_handler {
    ($name:ident, $kind:ident, $payload:ty) => {
        impl HubClient {
            /// Register a handler receiving the concrete event payload.
            pub fn $name(
                &self,
                handler: impl Fn(&$payload) + Send + Sync + 'static,
            ) -> Subscription {
                self.on(EventKind::$kind, move |event| {
                    if let ServerEvent::$kind(payload) = event {
                        handler(payload);
                    }
                })
            }
        }
    };
}

typed_handler!(on_connected, Connected, ConnectedEvent);
typed_handler!(on_joined_template, JoinedTemplate, JoinedTemplateEvent);
typed_handler!(on_user_joined, UserJoined, UserJoinedEvent);
typed_handler!(on_user_left, UserLeft, UserLeftEvent);
typed_handler!(on_new_comment, NewComment, NewCommentEvent);
typed_handler!(on_comment_added, CommentAdded, CommentAddedEvent);
typed_handler!(on_like_toggled, LikeToggled, LikeToggledEvent);
typed_handler!(on_like_result, LikeResult, LikeResultEvent);
typed_handler!(on_template_activity, TemplateActivity, TemplateActivityEvent);
typed_handler!(on_error, Error, ErrorEvent);

/// One live socket, as its two tasks.
struct Session {
    reader: tokio::task::JoinHandle<()>,
    writer: tokio::task::JoinHandle<()>,
}

impl Session {
    /// Resolves when either side finishes, aborting the other.
    async fn closed(mut self) {
        tokio::select! {
            _ = &mut self.reader => self.writer.abort(),
            _ = &mut self.writer => self.reader.abort(),
        };
    }
}

impl ClientInner {
    fn set_state(&self, next: ConnectionState) {
        *self.state.lock().expect("client state lock poisoned") = next;
    }

    async fn open_session(self: &Arc<Self>) -> Result<Session, ClientError> {
        let (ws_stream, _response) = connect_async(&self.endpoint)
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        *self
            .outbound
            .lock()
            .expect("client outbound lock poisoned") = Some(tx);
        self.set_state(ConnectionState::Connected);

        let writer = tokio::spawn(async move {
            while let Some(json) = rx.recv().await {
                if write.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            // channel dropped: intentional close, tell the server goodbye
            let _ = write.send(Message::Close(None)).await;
        });

        let inner = self.clone();
        let reader = tokio::spawn(async move {
            while let Some(message) = read.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<ServerEvent>(&text) {
                            Ok(event) => inner.handlers.dispatch(&event),
                            Err(e) => tracing::warn!("Unparseable server frame: {}", e),
                        }
                    }
                    Ok(Message::Close(_)) => {
                        tracing::info!("Server closed the connection");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("WebSocket read error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
        });

        Ok(Session { reader, writer })
    }

    async fn supervise(self: Arc<Self>, mut session: Session) {
        loop {
            session.closed().await;
            self.outbound
                .lock()
                .expect("client outbound lock poisoned")
                .take();

            if self.closing.load(Ordering::SeqCst) {
                tracing::info!("Client session ended");
                self.set_state(ConnectionState::Disconnected);
                self.fire(&self.disconnected_hooks);
                return;
            }

            tracing::warn!("Connection lost, attempting to reconnect");
            self.set_state(ConnectionState::Reconnecting);
            match self.reconnect().await {
                Some(next) => {
                    tracing::info!("Reconnected to {}", self.endpoint);
                    self.fire(&self.reconnected_hooks);
                    session = next;
                }
                None => {
                    self.set_state(ConnectionState::Disconnected);
                    self.fire(&self.disconnected_hooks);
                    return;
                }
            }
        }
    }

    async fn reconnect(self: &Arc<Self>) -> Option<Session> {
        let mut attempt = 0;
        while let Some(delay) = self.policy.delay_for(attempt) {
            tracing::info!(
                "Reconnect attempt {}/{} in {:?}",
                attempt + 1,
                self.policy.max_attempts,
                delay
            );
            tokio::time::sleep(delay).await;
            if self.closing.load(Ordering::SeqCst) {
                return None;
            }
            match self.open_session().await {
                Ok(session) => return Some(session),
                Err(e) => tracing::warn!("Reconnect attempt {} failed: {}", attempt + 1, e),
            }
            attempt += 1;
        }
        tracing::error!(
            "Failed to reconnect after {} attempts, giving up",
            self.policy.max_attempts
        );
        None
    }

    fn fire(&self, hooks: &Mutex<Vec<Hook>>) {
        let snapshot: Vec<Hook> = hooks
            .lock()
            .expect("client hooks lock poisoned")
            .clone();
        for hook in snapshot {
            hook();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_initial_state_is_disconnected() {
        let client = HubClient::new("ws://127.0.0.1:8080/hub", None);
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_invoke_while_disconnected_fails_fast() {
        let client = HubClient::new("ws://127.0.0.1:8080/hub", None);

        let result = client.invoke(&ClientInvocation::ToggleLike {
            template_id: Uuid::new_v4(),
        });

        assert!(matches!(result, Err(ClientError::NotConnected)));
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_returns_false() {
        // bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HubClient::new(&format!("ws://{}/hub", addr), None);

        assert!(!client.connect().await);
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_while_reconnecting_does_not_start_a_second_session() {
        let client = HubClient::new("ws://127.0.0.1:8080/hub", None);
        client.inner.set_state(ConnectionState::Reconnecting);

        assert!(!client.connect().await);
        assert_eq!(client.state(), ConnectionState::Reconnecting);
    }

    #[tokio::test]
    async fn test_reconnect_gives_up_after_attempt_budget() {
        use std::time::Duration;

        // accept exactly one handshake, then drop the socket and listener
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            drop(ws);
        });

        let policy = ReconnectPolicy {
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(20),
            max_attempts: 3,
        };
        let client = HubClient::with_policy(&format!("ws://{}/hub", addr), None, policy);
        let gave_up = Arc::new(AtomicBool::new(false));
        let flag = gave_up.clone();
        client.on_disconnected(move || flag.store(true, Ordering::SeqCst));

        assert!(client.connect().await);

        // wait for the supervisor to burn through the backoff schedule
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !gave_up.load(Ordering::SeqCst) {
            assert!(
                tokio::time::Instant::now() < deadline,
                "client never gave up reconnecting"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(client.state(), ConnectionState::Disconnected);
        let result = client.invoke(&ClientInvocation::ToggleLike {
            template_id: Uuid::new_v4(),
        });
        assert!(matches!(result, Err(ClientError::NotConnected)));
    }

    #[test]
    fn test_access_token_lands_in_query() {
        let client = HubClient::new("ws://127.0.0.1:8080/hub", Some("secret"));
        assert!(
            client
                .inner
                .endpoint
                .ends_with("/hub?access_token=secret")
        );
    }
}
