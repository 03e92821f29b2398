//! The template activity hub: connection registry, group membership and
//! event fan-out behind a single lock.

use tokio::sync::{Mutex, mpsc};

use formpulse_shared::protocol::{Identity, ServerEvent, TemplateId};
use formpulse_shared::time::utc_timestamp_ms;

use crate::domain::ConnectionId;

mod state;

pub use state::{ConnectionEntry, HubState, JoinOutcome};

/// Process-wide hub shared by every connection task.
///
/// All routing maps live in one [`HubState`] guarded by one mutex, so
/// membership transitions (a join replacing a previous group, a disconnect
/// removing a member) are linearizable. No await point is crossed while the
/// lock is held for a mutation; sends happen on snapshots taken under the
/// lock.
pub struct TemplateHub {
    state: Mutex<HubState>,
}

impl TemplateHub {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HubState::new()),
        }
    }

    /// Register a fresh connection and hand back its identifier.
    pub async fn register(&self, sender: mpsc::UnboundedSender<String>) -> ConnectionId {
        let connection_id = ConnectionId::generate();
        let mut state = self.state.lock().await;
        state.insert_connection(
            connection_id,
            ConnectionEntry {
                sender,
                identity: None,
                connected_at: utc_timestamp_ms(),
            },
        );
        tracing::debug!("Connection '{}' registered", connection_id);
        connection_id
    }

    /// Bind the identity resolved from the handshake credentials.
    pub async fn bind_identity(&self, connection_id: ConnectionId, identity: Identity) {
        let mut state = self.state.lock().await;
        if !state.bind_identity(connection_id, identity) {
            tracing::warn!(
                "Cannot bind identity: connection '{}' is not registered",
                connection_id
            );
        }
    }

    pub async fn identity_of(&self, connection_id: ConnectionId) -> Option<Identity> {
        self.state.lock().await.identity_of(connection_id)
    }

    pub async fn watched_template(&self, connection_id: ConnectionId) -> Option<TemplateId> {
        self.state.lock().await.watched_template(connection_id)
    }

    /// Drop the connection and its group membership. Returns the template it
    /// was watching, if any. No broadcast is emitted here; disconnect-driven
    /// removal is silent by design.
    pub async fn unregister(&self, connection_id: ConnectionId) -> Option<TemplateId> {
        let previous = self.state.lock().await.remove_connection(connection_id);
        tracing::debug!(
            "Connection '{}' unregistered (was watching: {:?})",
            connection_id,
            previous
        );
        previous
    }

    /// Move the connection into the template's group, leaving any previous
    /// group atomically. `None` means the connection is gone (raced with a
    /// disconnect).
    pub async fn join(
        &self,
        connection_id: ConnectionId,
        template_id: TemplateId,
    ) -> Option<JoinOutcome> {
        self.state.lock().await.join(connection_id, template_id)
    }

    /// Remove the connection from the template's group. `false` when it was
    /// not a member.
    pub async fn leave(&self, connection_id: ConnectionId, template_id: TemplateId) -> bool {
        self.state.lock().await.leave(connection_id, template_id)
    }

    pub async fn members_of(&self, template_id: TemplateId) -> Vec<ConnectionId> {
        self.state.lock().await.members_of(template_id)
    }

    pub async fn connection_count(&self) -> usize {
        self.state.lock().await.connection_count()
    }

    /// Push one event to one connection. Fails silently when the connection
    /// no longer exists: the client may have disconnected between group
    /// lookup and delivery.
    pub async fn send_to(&self, connection_id: ConnectionId, event: &ServerEvent) {
        let Some(json) = serialize(event) else { return };
        let sender = self.state.lock().await.sender_of(connection_id);
        match sender {
            Some(sender) => {
                if sender.send(json).is_err() {
                    tracing::warn!(
                        "Failed to push {:?} to connection '{}': receiver closed",
                        event.kind(),
                        connection_id
                    );
                }
            }
            None => {
                tracing::debug!(
                    "Dropping {:?} for unknown connection '{}'",
                    event.kind(),
                    connection_id
                );
            }
        }
    }

    /// Fan one event out to every current member of the template's group.
    ///
    /// The event is serialized once and each member gets one non-blocking
    /// send; a dead member is logged and skipped so it can never stall the
    /// rest of the group.
    pub async fn broadcast(
        &self,
        template_id: TemplateId,
        event: &ServerEvent,
        exclude: Option<ConnectionId>,
    ) {
        let Some(json) = serialize(event) else { return };
        let targets = self
            .state
            .lock()
            .await
            .group_senders(template_id, exclude);

        for (connection_id, sender) in targets {
            if sender.send(json.clone()).is_err() {
                tracing::warn!(
                    "Failed to broadcast {:?} to connection '{}', skipping",
                    event.kind(),
                    connection_id
                );
            }
        }
    }
}

impl Default for TemplateHub {
    fn default() -> Self {
        Self::new()
    }
}

fn serialize(event: &ServerEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!("Failed to serialize {:?} event: {}", event.kind(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formpulse_shared::protocol::{ErrorEvent, JoinedTemplateEvent};
    use uuid::Uuid;

    fn error_event(message: &str) -> ServerEvent {
        ServerEvent::Error(ErrorEvent {
            message: message.to_string(),
            error_code: None,
            occurred_at: 0,
        })
    }

    async fn register(hub: &TemplateHub) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (hub.register(tx).await, rx)
    }

    #[tokio::test]
    async fn test_send_to_delivers_serialized_event() {
        let hub = TemplateHub::new();
        let (conn, mut rx) = register(&hub).await;
        let template_id = Uuid::new_v4();

        hub.send_to(
            conn,
            &ServerEvent::JoinedTemplate(JoinedTemplateEvent {
                template_id,
                message: "ok".to_string(),
            }),
        )
        .await;

        let frame = rx.recv().await.unwrap();
        let parsed: ServerEvent = serde_json::from_str(&frame).unwrap();
        assert!(matches!(parsed, ServerEvent::JoinedTemplate(e) if e.template_id == template_id));
    }

    #[tokio::test]
    async fn test_send_to_unknown_connection_is_silent() {
        let hub = TemplateHub::new();
        // must not panic or error
        hub.send_to(ConnectionId::generate(), &error_event("boom"))
            .await;
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_members() {
        let hub = TemplateHub::new();
        let (a, mut rx_a) = register(&hub).await;
        let (b, mut rx_b) = register(&hub).await;
        let (_, mut rx_other) = register(&hub).await;
        let template = Uuid::new_v4();
        hub.join(a, template).await.unwrap();
        hub.join(b, template).await.unwrap();

        hub.broadcast(template, &error_event("to group"), None).await;

        assert!(rx_a.recv().await.is_some());
        assert!(rx_b.recv().await.is_some());
        assert!(rx_other.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_skips_excluded_connection() {
        let hub = TemplateHub::new();
        let (a, mut rx_a) = register(&hub).await;
        let (b, mut rx_b) = register(&hub).await;
        let template = Uuid::new_v4();
        hub.join(a, template).await.unwrap();
        hub.join(b, template).await.unwrap();

        hub.broadcast(template, &error_event("not for a"), Some(a))
            .await;

        assert!(rx_b.recv().await.is_some());
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_survives_dead_member() {
        let hub = TemplateHub::new();
        let (a, rx_a) = register(&hub).await;
        let (b, mut rx_b) = register(&hub).await;
        let template = Uuid::new_v4();
        hub.join(a, template).await.unwrap();
        hub.join(b, template).await.unwrap();

        // a's receiver is gone but the connection is still registered
        drop(rx_a);

        hub.broadcast(template, &error_event("still delivered"), None)
            .await;

        assert!(rx_b.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_unregister_removes_from_group() {
        let hub = TemplateHub::new();
        let (a, _rx_a) = register(&hub).await;
        let (b, _rx_b) = register(&hub).await;
        let template = Uuid::new_v4();
        hub.join(a, template).await.unwrap();
        hub.join(b, template).await.unwrap();

        let previous = hub.unregister(a).await;

        assert_eq!(previous, Some(template));
        assert_eq!(hub.members_of(template).await, vec![b]);
        assert_eq!(hub.connection_count().await, 1);
    }

    #[tokio::test]
    async fn test_identity_binding_roundtrip() {
        let hub = TemplateHub::new();
        let (conn, _rx) = register(&hub).await;
        let identity = Identity {
            user_id: Uuid::new_v4(),
            user_name: "alice".to_string(),
        };

        assert_eq!(hub.identity_of(conn).await, None);
        hub.bind_identity(conn, identity.clone()).await;
        assert_eq!(hub.identity_of(conn).await, Some(identity));
    }
}
