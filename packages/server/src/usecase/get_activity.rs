//! UseCase: load the recent-activity snapshot for a template.

use std::sync::Arc;

use formpulse_shared::protocol::{ServerEvent, TemplateActivityEvent, TemplateId, error_codes};
use formpulse_shared::time::utc_timestamp_ms;

use crate::domain::{
    CommentStore, ConnectionId, LikeStore, RECENT_COMMENTS_LIMIT, TemplateAccessPolicy,
};
use crate::hub::TemplateHub;

use super::HubOperationError;

/// Read-only activity snapshot: recent comments plus current like state.
/// Sent to the requesting caller only, never broadcast.
pub struct GetTemplateActivityUseCase {
    hub: Arc<TemplateHub>,
    access: Arc<dyn TemplateAccessPolicy>,
    comments: Arc<dyn CommentStore>,
    likes: Arc<dyn LikeStore>,
}

impl GetTemplateActivityUseCase {
    pub fn new(
        hub: Arc<TemplateHub>,
        access: Arc<dyn TemplateAccessPolicy>,
        comments: Arc<dyn CommentStore>,
        likes: Arc<dyn LikeStore>,
    ) -> Self {
        Self {
            hub,
            access,
            comments,
            likes,
        }
    }

    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        template_id: TemplateId,
    ) -> Result<(), HubOperationError> {
        let identity = self.hub.identity_of(connection_id).await;
        let user_id = identity.map(|i| i.user_id);

        let allowed = self
            .access
            .check_access(template_id, user_id)
            .await
            .map_err(|e| HubOperationError::store(error_codes::LOAD_ACTIVITY_ERROR, e))?;
        if !allowed {
            return Err(HubOperationError::AccessDenied);
        }

        let recent_comments = self
            .comments
            .recent_comments(template_id, RECENT_COMMENTS_LIMIT)
            .await
            .map_err(|e| HubOperationError::store(error_codes::LOAD_ACTIVITY_ERROR, e))?;
        let snapshot = self
            .likes
            .like_snapshot(template_id, user_id)
            .await
            .map_err(|e| HubOperationError::store(error_codes::LOAD_ACTIVITY_ERROR, e))?;

        self.hub
            .send_to(
                connection_id,
                &ServerEvent::TemplateActivity(TemplateActivityEvent {
                    template_id,
                    recent_comments,
                    likes_count: snapshot.likes_count,
                    user_liked: snapshot.user_liked,
                    loaded_at: utc_timestamp_ms(),
                }),
            )
            .await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockCommentStore, MockLikeStore, MockTemplateAccessPolicy};
    use formpulse_shared::protocol::{CommentRecord, Identity, LikeSnapshot};
    use tokio::sync::mpsc;
    use uuid::Uuid;

    fn allow_all() -> Arc<MockTemplateAccessPolicy> {
        let mut access = MockTemplateAccessPolicy::new();
        access.expect_check_access().returning(|_, _| Ok(true));
        Arc::new(access)
    }

    fn comment(template_id: TemplateId, content: &str, created_at: i64) -> CommentRecord {
        CommentRecord {
            id: Uuid::new_v4(),
            template_id,
            author_id: Uuid::new_v4(),
            author_name: "alice".to_string(),
            content: content.to_string(),
            created_at,
        }
    }

    #[tokio::test]
    async fn test_snapshot_is_sent_to_caller_only() {
        let hub = Arc::new(TemplateHub::new());
        let template = Uuid::new_v4();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let caller = hub.register(tx).await;
        hub.bind_identity(
            caller,
            Identity {
                user_id: Uuid::new_v4(),
                user_name: "alice".to_string(),
            },
        )
        .await;
        let (other_tx, mut other_rx) = mpsc::unbounded_channel();
        let other = hub.register(other_tx).await;
        hub.join(other, template).await.unwrap();

        let mut comments = MockCommentStore::new();
        comments
            .expect_recent_comments()
            .withf(move |t, limit| *t == template && *limit == RECENT_COMMENTS_LIMIT)
            .returning(|t, _| Ok(vec![comment(t, "newest", 200), comment(t, "older", 100)]));
        let mut likes = MockLikeStore::new();
        likes.expect_like_snapshot().returning(|_, _| {
            Ok(LikeSnapshot {
                likes_count: 3,
                user_liked: true,
            })
        });

        let usecase =
            GetTemplateActivityUseCase::new(hub.clone(), allow_all(), Arc::new(comments), Arc::new(likes));

        usecase.execute(caller, template).await.unwrap();

        let frame = rx.recv().await.unwrap();
        let event: ServerEvent = serde_json::from_str(&frame).unwrap();
        match event {
            ServerEvent::TemplateActivity(e) => {
                assert_eq!(e.template_id, template);
                assert_eq!(e.recent_comments.len(), 2);
                assert_eq!(e.recent_comments[0].content, "newest");
                assert_eq!(e.likes_count, 3);
                assert!(e.user_liked);
            }
            other => panic!("expected TemplateActivity, got {other:?}"),
        }
        // group members do not see read-only snapshots
        assert!(other_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_access_denied_loads_nothing() {
        let hub = Arc::new(TemplateHub::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        let caller = hub.register(tx).await;

        let mut access = MockTemplateAccessPolicy::new();
        access.expect_check_access().returning(|_, _| Ok(false));
        let mut comments = MockCommentStore::new();
        comments.expect_recent_comments().times(0);
        let mut likes = MockLikeStore::new();
        likes.expect_like_snapshot().times(0);

        let usecase = GetTemplateActivityUseCase::new(
            hub.clone(),
            Arc::new(access),
            Arc::new(comments),
            Arc::new(likes),
        );

        let result = usecase.execute(caller, Uuid::new_v4()).await;

        assert!(matches!(result, Err(HubOperationError::AccessDenied)));
    }

    #[tokio::test]
    async fn test_anonymous_caller_may_read() {
        let hub = Arc::new(TemplateHub::new());
        let template = Uuid::new_v4();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let caller = hub.register(tx).await;

        let mut comments = MockCommentStore::new();
        comments
            .expect_recent_comments()
            .returning(|_, _| Ok(Vec::new()));
        let mut likes = MockLikeStore::new();
        likes
            .expect_like_snapshot()
            .withf(|_, user| user.is_none())
            .returning(|_, _| {
                Ok(LikeSnapshot {
                    likes_count: 0,
                    user_liked: false,
                })
            });

        let usecase =
            GetTemplateActivityUseCase::new(hub.clone(), allow_all(), Arc::new(comments), Arc::new(likes));

        usecase.execute(caller, template).await.unwrap();

        let frame = rx.recv().await.unwrap();
        let event: ServerEvent = serde_json::from_str(&frame).unwrap();
        assert!(matches!(
            event,
            ServerEvent::TemplateActivity(e) if !e.user_liked && e.recent_comments.is_empty()
        ));
    }
}
