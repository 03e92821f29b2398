//! UseCase: toggle the caller's like on a template.

use std::sync::Arc;

use formpulse_shared::protocol::{
    LikeResultEvent, LikeToggledEvent, ServerEvent, TemplateId, error_codes,
};
use formpulse_shared::time::utc_timestamp_ms;

use crate::domain::{ConnectionId, LikeStore};
use crate::hub::TemplateHub;

use super::HubOperationError;

/// Delegates the toggle to the like store and fans the authoritative
/// snapshot out to the group.
///
/// The broadcast is a full snapshot, not a delta: two concurrent toggles can
/// complete in either order, and consumers replace their local count with the
/// latest `total_likes` instead of incrementing.
pub struct ToggleLikeUseCase {
    hub: Arc<TemplateHub>,
    likes: Arc<dyn LikeStore>,
}

impl ToggleLikeUseCase {
    pub fn new(hub: Arc<TemplateHub>, likes: Arc<dyn LikeStore>) -> Self {
        Self { hub, likes }
    }

    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        template_id: TemplateId,
    ) -> Result<(), HubOperationError> {
        let identity = self
            .hub
            .identity_of(connection_id)
            .await
            .ok_or(HubOperationError::AuthRequired {
                action: "toggle likes",
            })?;

        let result = self
            .likes
            .toggle_like(template_id, identity.user_id)
            .await
            .map_err(|e| HubOperationError::store(error_codes::TOGGLE_LIKE_ERROR, e))?;

        self.hub
            .send_to(
                connection_id,
                &ServerEvent::LikeResult(LikeResultEvent {
                    success: true,
                    result: result.clone(),
                }),
            )
            .await;

        self.hub
            .broadcast(
                template_id,
                &ServerEvent::LikeToggled(LikeToggledEvent {
                    template_id,
                    total_likes: result.total_likes,
                    is_liked: result.is_liked,
                    action: result.action,
                    user_id: identity.user_id,
                    user_name: identity.user_name,
                    updated_at: utc_timestamp_ms(),
                }),
                None,
            )
            .await;

        tracing::info!(
            "Connection '{}' toggled like on template '{}' ({:?})",
            connection_id,
            template_id,
            result.action
        );
        Ok(())
    }
}
