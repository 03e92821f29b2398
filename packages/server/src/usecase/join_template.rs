//! UseCase: join a template's activity group.

use std::sync::Arc;

use formpulse_shared::protocol::{
    JoinedTemplateEvent, ServerEvent, TemplateId, UserJoinedEvent, UserLeftEvent, error_codes,
};
use formpulse_shared::time::utc_timestamp_ms;

use crate::domain::{ConnectionId, TemplateAccessPolicy};
use crate::hub::{JoinOutcome, TemplateHub};

use super::HubOperationError;

/// Moves a connection into the group of the template it wants to watch.
///
/// A connection watches at most one template: joining a new one implicitly
/// leaves the previous group, announcing `UserLeft` there and `UserJoined` in
/// the new group (self included) before the `JoinedTemplate` ack. Re-joining
/// the template already being watched only re-sends the ack.
pub struct JoinTemplateUseCase {
    hub: Arc<TemplateHub>,
    access: Arc<dyn TemplateAccessPolicy>,
}

impl JoinTemplateUseCase {
    pub fn new(hub: Arc<TemplateHub>, access: Arc<dyn TemplateAccessPolicy>) -> Self {
        Self { hub, access }
    }

    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        template_id: TemplateId,
    ) -> Result<(), HubOperationError> {
        let identity = self.hub.identity_of(connection_id).await;

        let allowed = self
            .access
            .check_access(template_id, identity.as_ref().map(|i| i.user_id))
            .await
            .map_err(|e| HubOperationError::store(error_codes::JOIN_TEMPLATE_ERROR, e))?;
        if !allowed {
            return Err(HubOperationError::AccessDenied);
        }

        match self.hub.join(connection_id, template_id).await {
            None => return Err(HubOperationError::ConnectionGone),
            Some(JoinOutcome::AlreadyWatching) => {
                tracing::debug!(
                    "Connection '{}' re-joined template '{}'",
                    connection_id,
                    template_id
                );
            }
            Some(JoinOutcome::Moved { previous }) => {
                if let Some(identity) = &identity {
                    if let Some(previous_template) = previous {
                        self.hub
                            .broadcast(
                                previous_template,
                                &ServerEvent::UserLeft(UserLeftEvent {
                                    user_id: identity.user_id,
                                    user_name: identity.user_name.clone(),
                                    template_id: previous_template,
                                    left_at: utc_timestamp_ms(),
                                }),
                                None,
                            )
                            .await;
                    }

                    self.hub
                        .broadcast(
                            template_id,
                            &ServerEvent::UserJoined(UserJoinedEvent {
                                user_id: identity.user_id,
                                user_name: identity.user_name.clone(),
                                template_id,
                                joined_at: utc_timestamp_ms(),
                            }),
                            None,
                        )
                        .await;
                }
                tracing::info!(
                    "Connection '{}' joined template '{}' (previous: {:?})",
                    connection_id,
                    template_id,
                    previous
                );
            }
        }

        self.hub
            .send_to(
                connection_id,
                &ServerEvent::JoinedTemplate(JoinedTemplateEvent {
                    template_id,
                    message: "Successfully joined template activity".to_string(),
                }),
            )
            .await;

        Ok(())
    }
}
