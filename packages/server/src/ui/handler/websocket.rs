//! WebSocket connection handler.
//!
//! One task pair per connection: a receive loop parsing [`ClientInvocation`]
//! frames and dispatching them to the usecases, and a push loop draining the
//! connection's outbox channel into the socket. When either side finishes the
//! other is aborted and the connection is unregistered from the hub.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use formpulse_shared::protocol::{
    ClientInvocation, ConnectedEvent, ErrorEvent, Identity, ServerEvent, error_codes,
};
use formpulse_shared::time::utc_timestamp_ms;

use crate::{domain::ConnectionId, ui::state::AppState, usecase::HubOperationError};

/// Query parameters for the WebSocket handshake.
///
/// A missing or unknown `access_token` yields an anonymous connection, not a
/// rejected handshake; read-only operations stay available to viewers who
/// never signed in.
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub access_token: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> impl IntoResponse {
    let identity = query
        .access_token
        .as_deref()
        .and_then(|token| state.verifier.verify(token));

    ws.on_upgrade(move |socket| handle_socket(socket, state, identity))
}

/// Spawns a task that drains the connection's outbox channel into the socket.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, identity: Option<Identity>) {
    let (sender, mut receiver) = socket.split();

    let (tx, rx) = mpsc::unbounded_channel();
    let connection_id = state.hub.register(tx).await;
    if let Some(identity) = identity.clone() {
        state.hub.bind_identity(connection_id, identity).await;
    }
    tracing::info!(
        "Connection '{}' established (user: {})",
        connection_id,
        identity
            .as_ref()
            .map(|i| i.user_name.as_str())
            .unwrap_or("anonymous")
    );

    // Handshake ack goes through the outbox so it is ordered before any
    // event a concurrent broadcast might enqueue.
    let connected = ServerEvent::Connected(ConnectedEvent {
        connection_id: connection_id.to_string(),
        user_id: identity.as_ref().map(|i| i.user_id),
        user_name: identity.as_ref().map(|i| i.user_name.clone()),
        is_authenticated: identity.is_some(),
        connected_at: utc_timestamp_ms(),
    });
    state.hub.send_to(connection_id, &connected).await;

    let state_clone = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    handle_frame(&state_clone, connection_id, &text).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping from '{}'", connection_id);
                    // pong is handled by the protocol layer
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    let previous = state.hub.unregister(connection_id).await;
    tracing::info!(
        "Connection '{}' closed (was watching: {:?})",
        connection_id,
        previous
    );
}

/// Parse one inbound frame and run the invoked operation.
///
/// Every failure path answers with a single `Error` event to the invoking
/// connection; nothing here tears the connection down.
async fn handle_frame(state: &AppState, connection_id: ConnectionId, text: &str) {
    let invocation = match serde_json::from_str::<ClientInvocation>(text) {
        Ok(invocation) => invocation,
        Err(e) => {
            tracing::warn!("Unparseable frame from '{}': {}", connection_id, e);
            let event = ServerEvent::Error(ErrorEvent {
                message: "Message is not a recognized hub invocation".to_string(),
                error_code: Some(error_codes::INVALID_MESSAGE.to_string()),
                occurred_at: utc_timestamp_ms(),
            });
            state.hub.send_to(connection_id, &event).await;
            return;
        }
    };

    tracing::debug!("Dispatching {:?} for '{}'", invocation, connection_id);
    if let Err(e) = dispatch(state, connection_id, invocation).await {
        tracing::warn!("Operation failed for '{}': {}", connection_id, e);
        let event = ServerEvent::Error(ErrorEvent {
            message: e.to_string(),
            error_code: Some(e.error_code().to_string()),
            occurred_at: utc_timestamp_ms(),
        });
        state.hub.send_to(connection_id, &event).await;
    }
}

async fn dispatch(
    state: &AppState,
    connection_id: ConnectionId,
    invocation: ClientInvocation,
) -> Result<(), HubOperationError> {
    match invocation {
        ClientInvocation::JoinTemplateGroup { template_id } => {
            state
                .join_template_usecase
                .execute(connection_id, template_id)
                .await
        }
        ClientInvocation::LeaveTemplateGroup { template_id } => {
            state
                .leave_template_usecase
                .execute(connection_id, template_id)
                .await
        }
        ClientInvocation::AddComment {
            template_id,
            content,
        } => {
            state
                .add_comment_usecase
                .execute(connection_id, template_id, &content)
                .await
        }
        ClientInvocation::ToggleLike { template_id } => {
            state
                .toggle_like_usecase
                .execute(connection_id, template_id)
                .await
        }
        ClientInvocation::GetTemplateActivity { template_id } => {
            state
                .get_activity_usecase
                .execute(connection_id, template_id)
                .await
        }
    }
}
