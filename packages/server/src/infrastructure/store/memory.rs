//! In-memory comment, like and access-policy implementations.
//!
//! These stand in for the platform's persistence layer so the hub can run
//! and be tested without a database. Each store serializes its own writes per
//! template through its mutex, matching the contract the hub expects from the
//! real persistence collaborators.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use formpulse_shared::protocol::{
    CommentRecord, LikeAction, LikeOutcome, LikeSnapshot, TemplateId, UserId,
};
use formpulse_shared::time::utc_timestamp_ms;

use crate::domain::{CommentStore, LikeStore, StoreError, TemplateAccessPolicy};

/// Shared user-id to display-name lookup.
///
/// The real platform resolves author names from the user repository; here a
/// registration-time map plays that role for both stores.
#[derive(Clone, Default)]
pub struct UserDirectory {
    users: Arc<RwLock<HashMap<UserId, String>>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user_id: UserId, user_name: &str) {
        self.users
            .write()
            .expect("user directory lock poisoned")
            .insert(user_id, user_name.to_string());
    }

    fn name_of(&self, user_id: UserId) -> Result<String, StoreError> {
        self.users
            .read()
            .expect("user directory lock poisoned")
            .get(&user_id)
            .cloned()
            .ok_or(StoreError::UserNotFound(user_id))
    }
}

/// Comment store keeping per-template comment lists in insertion order.
pub struct InMemoryCommentStore {
    users: UserDirectory,
    comments: Mutex<HashMap<TemplateId, Vec<CommentRecord>>>,
}

impl InMemoryCommentStore {
    pub fn new(users: UserDirectory) -> Self {
        Self {
            users,
            comments: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CommentStore for InMemoryCommentStore {
    async fn persist_comment(
        &self,
        template_id: TemplateId,
        author_id: UserId,
        content: &str,
    ) -> Result<CommentRecord, StoreError> {
        let author_name = self.users.name_of(author_id)?;
        let record = CommentRecord {
            id: Uuid::new_v4(),
            template_id,
            author_id,
            author_name,
            content: content.to_string(),
            created_at: utc_timestamp_ms(),
        };

        let mut comments = self.comments.lock().await;
        comments
            .entry(template_id)
            .or_default()
            .push(record.clone());

        tracing::debug!(
            "Persisted comment '{}' on template '{}'",
            record.id,
            template_id
        );
        Ok(record)
    }

    async fn recent_comments(
        &self,
        template_id: TemplateId,
        limit: usize,
    ) -> Result<Vec<CommentRecord>, StoreError> {
        let comments = self.comments.lock().await;
        let Some(list) = comments.get(&template_id) else {
            return Ok(Vec::new());
        };
        // newest first
        Ok(list.iter().rev().take(limit).cloned().collect())
    }
}

/// Like store: one like per user per template, toggled on and off.
pub struct InMemoryLikeStore {
    users: UserDirectory,
    likes: Mutex<HashMap<TemplateId, HashSet<UserId>>>,
}

impl InMemoryLikeStore {
    pub fn new(users: UserDirectory) -> Self {
        Self {
            users,
            likes: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl LikeStore for InMemoryLikeStore {
    async fn toggle_like(
        &self,
        template_id: TemplateId,
        user_id: UserId,
    ) -> Result<LikeOutcome, StoreError> {
        let user_name = self.users.name_of(user_id)?;

        let mut likes = self.likes.lock().await;
        let entry = likes.entry(template_id).or_default();
        let action = if entry.remove(&user_id) {
            LikeAction::Removed
        } else {
            entry.insert(user_id);
            LikeAction::Added
        };
        // recount after the mutation: the snapshot is authoritative
        let total_likes = entry.len() as u64;
        let is_liked = action == LikeAction::Added;

        Ok(LikeOutcome {
            is_liked,
            total_likes,
            action,
            last_like_user_id: is_liked.then_some(user_id),
            last_like_user_name: is_liked.then_some(user_name),
        })
    }

    async fn like_snapshot(
        &self,
        template_id: TemplateId,
        user_id: Option<UserId>,
    ) -> Result<LikeSnapshot, StoreError> {
        let likes = self.likes.lock().await;
        let Some(entry) = likes.get(&template_id) else {
            return Ok(LikeSnapshot {
                likes_count: 0,
                user_liked: false,
            });
        };
        Ok(LikeSnapshot {
            likes_count: entry.len() as u64,
            user_liked: user_id.is_some_and(|id| entry.contains(&id)),
        })
    }
}

/// Access policy: templates are public unless explicitly restricted to a set
/// of users. Anonymous viewers are denied on restricted templates.
#[derive(Default)]
pub struct InMemoryAccessPolicy {
    restricted: RwLock<HashMap<TemplateId, HashSet<UserId>>>,
}

impl InMemoryAccessPolicy {
    /// Every template is viewable by everyone.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Restrict a template to the given users.
    pub fn restrict(&self, template_id: TemplateId, allowed: impl IntoIterator<Item = UserId>) {
        self.restricted
            .write()
            .expect("access policy lock poisoned")
            .insert(template_id, allowed.into_iter().collect());
    }
}

#[async_trait]
impl TemplateAccessPolicy for InMemoryAccessPolicy {
    async fn check_access(
        &self,
        template_id: TemplateId,
        user_id: Option<UserId>,
    ) -> Result<bool, StoreError> {
        let restricted = self.restricted.read().expect("access policy lock poisoned");
        match restricted.get(&template_id) {
            Some(allowed) => Ok(user_id.is_some_and(|id| allowed.contains(&id))),
            None => Ok(true),
        }
    }
}
