//! Collaborator traits consumed by the hub.
//!
//! The hub owns connection and group lifetimes but does not own business
//! data: comments, likes and access rules live behind these traits. Usecases
//! depend on the traits only; the in-memory implementations in
//! `infrastructure` stand in for the real persistence layer.

use async_trait::async_trait;

use formpulse_shared::protocol::{CommentRecord, LikeOutcome, LikeSnapshot, TemplateId, UserId};

use super::StoreError;

/// Answers "may this user view this template's activity".
///
/// Anonymous connections check with `user_id = None`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TemplateAccessPolicy: Send + Sync {
    async fn check_access(
        &self,
        template_id: TemplateId,
        user_id: Option<UserId>,
    ) -> Result<bool, StoreError>;
}

/// Persists comments and serves the recent-comment window.
///
/// The store assigns the comment id and timestamp; the hub broadcasts the
/// returned record verbatim.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn persist_comment(
        &self,
        template_id: TemplateId,
        author_id: UserId,
        content: &str,
    ) -> Result<CommentRecord, StoreError>;

    /// Most recent comments, newest first.
    async fn recent_comments(
        &self,
        template_id: TemplateId,
        limit: usize,
    ) -> Result<Vec<CommentRecord>, StoreError>;
}

/// Owns like state per template and serializes its own writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LikeStore: Send + Sync {
    /// Toggle the user's like and return the authoritative post-toggle
    /// snapshot.
    async fn toggle_like(
        &self,
        template_id: TemplateId,
        user_id: UserId,
    ) -> Result<LikeOutcome, StoreError>;

    /// Current like count plus whether `user_id` (if any) has liked.
    async fn like_snapshot(
        &self,
        template_id: TemplateId,
        user_id: Option<UserId>,
    ) -> Result<LikeSnapshot, StoreError>;
}
