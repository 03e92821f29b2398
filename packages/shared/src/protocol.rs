//! Message types exchanged over the hub's WebSocket connection.
//!
//! Inbound messages are [`ClientInvocation`]s, tagged by `method`. Outbound
//! messages are [`ServerEvent`]s, tagged by `type`. Both sides speak camelCase
//! JSON, so the same frame can be consumed by non-Rust clients unchanged.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a form template whose activity is being watched.
pub type TemplateId = Uuid;

/// Identifier of a platform user.
pub type UserId = Uuid;

/// Authenticated identity bound to a connection at handshake time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: UserId,
    pub user_name: String,
}

/// A persisted comment as returned by the comment store.
///
/// `id` and `created_at` are store-assigned; the hub never substitutes
/// client-supplied values. Immutable once broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: Uuid,
    pub template_id: TemplateId,
    pub author_id: UserId,
    pub author_name: String,
    pub content: String,
    /// Unix epoch milliseconds, assigned by the store.
    pub created_at: i64,
}

/// What a like toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeAction {
    Added,
    Removed,
}

/// Authoritative like state immediately after a toggle.
///
/// This is a full snapshot, not a delta: consumers replace their local count
/// with `total_likes` instead of incrementing, because concurrent toggles can
/// race and only the latest snapshot is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeOutcome {
    pub is_liked: bool,
    pub total_likes: u64,
    pub action: LikeAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_like_user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_like_user_name: Option<String>,
}

/// Read-only like state for a template, relative to one viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeSnapshot {
    pub likes_count: u64,
    pub user_liked: bool,
}

/// Handshake acknowledgement, sent to the caller right after connecting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedEvent {
    pub connection_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub is_authenticated: bool,
    pub connected_at: i64,
}

/// Ack to the caller after a successful group join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedTemplateEvent {
    pub template_id: TemplateId,
    pub message: String,
}

/// Broadcast to a template group when an authenticated user joins it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserJoinedEvent {
    pub user_id: UserId,
    pub user_name: String,
    pub template_id: TemplateId,
    pub joined_at: i64,
}

/// Broadcast to a template group when an authenticated user leaves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLeftEvent {
    pub user_id: UserId,
    pub user_name: String,
    pub template_id: TemplateId,
    pub left_at: i64,
}

/// Broadcast to a template group when a comment is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCommentEvent {
    pub comment: CommentRecord,
    pub template_id: TemplateId,
    pub added_at: i64,
}

/// Ack to the comment author. Fires in addition to the `NewComment`
/// broadcast; the ack is immediate UI feedback, the broadcast is group state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAddedEvent {
    pub success: bool,
    pub comment: CommentRecord,
}

/// Broadcast to a template group after a like toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggledEvent {
    pub template_id: TemplateId,
    pub total_likes: u64,
    pub is_liked: bool,
    pub action: LikeAction,
    pub user_id: UserId,
    pub user_name: String,
    pub updated_at: i64,
}

/// Ack to the caller of a like toggle, carrying the authoritative outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResultEvent {
    pub success: bool,
    pub result: LikeOutcome,
}

/// Activity snapshot, sent to the requesting caller only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateActivityEvent {
    pub template_id: TemplateId,
    pub recent_comments: Vec<CommentRecord>,
    pub likes_count: u64,
    pub user_liked: bool,
    pub loaded_at: i64,
}

/// Error event, sent to the invoking connection only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEvent {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    pub occurred_at: i64,
}

/// Every event the hub can push to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    Connected(ConnectedEvent),
    JoinedTemplate(JoinedTemplateEvent),
    UserJoined(UserJoinedEvent),
    UserLeft(UserLeftEvent),
    NewComment(NewCommentEvent),
    CommentAdded(CommentAddedEvent),
    LikeToggled(LikeToggledEvent),
    LikeResult(LikeResultEvent),
    TemplateActivity(TemplateActivityEvent),
    Error(ErrorEvent),
}

impl ServerEvent {
    /// The enumerated kind of this event, used to key client-side handler
    /// registration.
    pub fn kind(&self) -> EventKind {
        match self {
            ServerEvent::Connected(_) => EventKind::Connected,
            ServerEvent::JoinedTemplate(_) => EventKind::JoinedTemplate,
            ServerEvent::UserJoined(_) => EventKind::UserJoined,
            ServerEvent::UserLeft(_) => EventKind::UserLeft,
            ServerEvent::NewComment(_) => EventKind::NewComment,
            ServerEvent::CommentAdded(_) => EventKind::CommentAdded,
            ServerEvent::LikeToggled(_) => EventKind::LikeToggled,
            ServerEvent::LikeResult(_) => EventKind::LikeResult,
            ServerEvent::TemplateActivity(_) => EventKind::TemplateActivity,
            ServerEvent::Error(_) => EventKind::Error,
        }
    }
}

/// Discriminant of [`ServerEvent`], without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connected,
    JoinedTemplate,
    UserJoined,
    UserLeft,
    NewComment,
    CommentAdded,
    LikeToggled,
    LikeResult,
    TemplateActivity,
    Error,
}

impl EventKind {
    /// All event kinds, for bulk handler removal.
    pub const ALL: [EventKind; 10] = [
        EventKind::Connected,
        EventKind::JoinedTemplate,
        EventKind::UserJoined,
        EventKind::UserLeft,
        EventKind::NewComment,
        EventKind::CommentAdded,
        EventKind::LikeToggled,
        EventKind::LikeResult,
        EventKind::TemplateActivity,
        EventKind::Error,
    ];
}

/// Every method a client can invoke on the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum ClientInvocation {
    #[serde(rename_all = "camelCase")]
    JoinTemplateGroup { template_id: TemplateId },
    #[serde(rename_all = "camelCase")]
    LeaveTemplateGroup { template_id: TemplateId },
    #[serde(rename_all = "camelCase")]
    AddComment {
        template_id: TemplateId,
        content: String,
    },
    #[serde(rename_all = "camelCase")]
    ToggleLike { template_id: TemplateId },
    #[serde(rename_all = "camelCase")]
    GetTemplateActivity { template_id: TemplateId },
}

/// Machine-readable error codes carried by [`ErrorEvent`].
pub mod error_codes {
    pub const ACCESS_DENIED: &str = "ACCESS_DENIED";
    pub const AUTH_REQUIRED: &str = "AUTH_REQUIRED";
    pub const EMPTY_CONTENT: &str = "EMPTY_CONTENT";
    pub const CONTENT_TOO_LONG: &str = "CONTENT_TOO_LONG";
    pub const NOT_WATCHING: &str = "NOT_WATCHING";
    pub const CONNECTION_ERROR: &str = "CONNECTION_ERROR";
    pub const INVALID_MESSAGE: &str = "INVALID_MESSAGE";
    pub const JOIN_TEMPLATE_ERROR: &str = "JOIN_TEMPLATE_ERROR";
    pub const LEAVE_TEMPLATE_ERROR: &str = "LEAVE_TEMPLATE_ERROR";
    pub const ADD_COMMENT_ERROR: &str = "ADD_COMMENT_ERROR";
    pub const TOGGLE_LIKE_ERROR: &str = "TOGGLE_LIKE_ERROR";
    pub const LOAD_ACTIVITY_ERROR: &str = "LOAD_ACTIVITY_ERROR";
}
