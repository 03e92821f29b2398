//! UseCase: add a comment to the watched template.

use std::sync::Arc;

use formpulse_shared::protocol::{
    CommentAddedEvent, NewCommentEvent, ServerEvent, TemplateId, error_codes,
};
use formpulse_shared::time::utc_timestamp_ms;

use crate::domain::{CommentContent, CommentStore, ConnectionId};
use crate::hub::TemplateHub;

use super::HubOperationError;

/// Persists a comment and announces it to the template's group.
///
/// Requires an authenticated caller that is watching the template. The
/// broadcast carries the store-assigned id and timestamp, never
/// client-supplied values. The author gets both the `CommentAdded` ack and
/// the `NewComment` broadcast; the duplication is intentional (immediate UI
/// feedback vs. group state) and must not be collapsed.
pub struct AddCommentUseCase {
    hub: Arc<TemplateHub>,
    comments: Arc<dyn CommentStore>,
}

impl AddCommentUseCase {
    pub fn new(hub: Arc<TemplateHub>, comments: Arc<dyn CommentStore>) -> Self {
        Self { hub, comments }
    }

    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        template_id: TemplateId,
        raw_content: &str,
    ) -> Result<(), HubOperationError> {
        let identity = self
            .hub
            .identity_of(connection_id)
            .await
            .ok_or(HubOperationError::AuthRequired {
                action: "add comments",
            })?;

        if self.hub.watched_template(connection_id).await != Some(template_id) {
            return Err(HubOperationError::NotWatching);
        }

        // Validation happens before the store is touched.
        let content = CommentContent::new(raw_content)?;

        let comment = self
            .comments
            .persist_comment(template_id, identity.user_id, content.as_str())
            .await
            .map_err(|e| HubOperationError::store(error_codes::ADD_COMMENT_ERROR, e))?;

        self.hub
            .send_to(
                connection_id,
                &ServerEvent::CommentAdded(CommentAddedEvent {
                    success: true,
                    comment: comment.clone(),
                }),
            )
            .await;

        self.hub
            .broadcast(
                template_id,
                &ServerEvent::NewComment(NewCommentEvent {
                    comment,
                    template_id,
                    added_at: utc_timestamp_ms(),
                }),
                None,
            )
            .await;

        tracing::info!(
            "Connection '{}' commented on template '{}'",
            connection_id,
            template_id
        );
        Ok(())
    }
}
