//! UseCase: leave a template's activity group.

use std::sync::Arc;

use formpulse_shared::protocol::{ServerEvent, TemplateId, UserLeftEvent};
use formpulse_shared::time::utc_timestamp_ms;

use crate::domain::ConnectionId;
use crate::hub::TemplateHub;

use super::HubOperationError;

/// Removes a connection from a group and tells the remaining members.
///
/// Leaving a group the connection is not in is a silent no-op.
pub struct LeaveTemplateUseCase {
    hub: Arc<TemplateHub>,
}

impl LeaveTemplateUseCase {
    pub fn new(hub: Arc<TemplateHub>) -> Self {
        Self { hub }
    }

    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        template_id: TemplateId,
    ) -> Result<(), HubOperationError> {
        let identity = self.hub.identity_of(connection_id).await;

        if !self.hub.leave(connection_id, template_id).await {
            tracing::debug!(
                "Connection '{}' left template '{}' it was not watching; ignoring",
                connection_id,
                template_id
            );
            return Ok(());
        }

        if let Some(identity) = identity {
            self.hub
                .broadcast(
                    template_id,
                    &ServerEvent::UserLeft(UserLeftEvent {
                        user_id: identity.user_id,
                        user_name: identity.user_name,
                        template_id,
                        left_at: utc_timestamp_ms(),
                    }),
                    None,
                )
                .await;
        }

        tracing::info!(
            "Connection '{}' left template '{}'",
            connection_id,
            template_id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formpulse_shared::protocol::Identity;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    async fn connect(
        hub: &Arc<TemplateHub>,
        name: &str,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection_id = hub.register(tx).await;
        hub.bind_identity(
            connection_id,
            Identity {
                user_id: Uuid::new_v4(),
                user_name: name.to_string(),
            },
        )
        .await;
        (connection_id, rx)
    }

    #[tokio::test]
    async fn test_leave_notifies_remaining_members() {
        let hub = Arc::new(TemplateHub::new());
        let usecase = LeaveTemplateUseCase::new(hub.clone());
        let (leaver, _leaver_rx) = connect(&hub, "alice").await;
        let (stayer, mut stayer_rx) = connect(&hub, "bob").await;
        let template = Uuid::new_v4();
        hub.join(leaver, template).await.unwrap();
        hub.join(stayer, template).await.unwrap();

        usecase.execute(leaver, template).await.unwrap();

        let frame = stayer_rx.recv().await.unwrap();
        let event: ServerEvent = serde_json::from_str(&frame).unwrap();
        assert!(matches!(
            event,
            ServerEvent::UserLeft(e) if e.user_name == "alice" && e.template_id == template
        ));
        assert_eq!(hub.members_of(template).await, vec![stayer]);
    }

    #[tokio::test]
    async fn test_leave_when_not_member_is_noop() {
        let hub = Arc::new(TemplateHub::new());
        let usecase = LeaveTemplateUseCase::new(hub.clone());
        let (conn, mut rx) = connect(&hub, "alice").await;

        usecase.execute(conn, Uuid::new_v4()).await.unwrap();

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_anonymous_leave_emits_no_user_left() {
        let hub = Arc::new(TemplateHub::new());
        let usecase = LeaveTemplateUseCase::new(hub.clone());
        let (tx, _rx) = mpsc::unbounded_channel();
        let anonymous = hub.register(tx).await;
        let (stayer, mut stayer_rx) = connect(&hub, "bob").await;
        let template = Uuid::new_v4();
        hub.join(anonymous, template).await.unwrap();
        hub.join(stayer, template).await.unwrap();

        usecase.execute(anonymous, template).await.unwrap();

        assert!(stayer_rx.try_recv().is_err());
        assert_eq!(hub.members_of(template).await, vec![stayer]);
    }
}
