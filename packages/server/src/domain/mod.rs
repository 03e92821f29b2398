//! Domain value objects and collaborator interfaces.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use formpulse_shared::protocol::{Identity, TemplateId, UserId};

mod store;

pub use store::{CommentStore, LikeStore, TemplateAccessPolicy};

#[cfg(test)]
pub use store::{MockCommentStore, MockLikeStore, MockTemplateAccessPolicy};

/// How many comments `GetTemplateActivity` returns.
pub const RECENT_COMMENTS_LIMIT: usize = 10;

/// Upper bound for a single comment, after trimming.
pub const MAX_COMMENT_LENGTH: usize = 2000;

/// Opaque identifier of one live client connection.
///
/// Assigned by the hub at transport handshake; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Validated comment content: non-empty after trimming, bounded length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentContent(String);

impl CommentContent {
    pub fn new(raw: &str) -> Result<Self, ContentError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ContentError::Empty);
        }
        if trimmed.len() > MAX_COMMENT_LENGTH {
            return Err(ContentError::TooLong(trimmed.len()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Comment content validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("Comment content cannot be empty")]
    Empty,

    #[error("Comment content exceeds {MAX_COMMENT_LENGTH} characters (got {0})")]
    TooLong(usize),
}

/// Failures reported by the backing stores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("User '{0}' not found")]
    UserNotFound(UserId),

    #[error("Template '{0}' not found")]
    TemplateNotFound(TemplateId),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Resolves a handshake bearer token to an identity.
///
/// Validation happens once at connect time; the hub never re-validates per
/// message. A `None` result yields an unauthenticated connection, which may
/// still join groups and read activity but cannot comment or like.
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Option<Identity>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_content_trims_surrounding_whitespace() {
        let content = CommentContent::new("  hello world \n").unwrap();
        assert_eq!(content.as_str(), "hello world");
    }

    #[test]
    fn test_comment_content_rejects_empty() {
        assert_eq!(CommentContent::new(""), Err(ContentError::Empty));
    }

    #[test]
    fn test_comment_content_rejects_whitespace_only() {
        assert_eq!(CommentContent::new("   \t\n"), Err(ContentError::Empty));
    }

    #[test]
    fn test_comment_content_rejects_overlong() {
        let raw = "x".repeat(MAX_COMMENT_LENGTH + 1);
        assert!(matches!(
            CommentContent::new(&raw),
            Err(ContentError::TooLong(_))
        ));
    }

    #[test]
    fn test_connection_ids_are_unique() {
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();
        assert_ne!(a, b);
    }
}
