//! Failures surfaced to the invoking connection.
//!
//! Every variant maps to exactly one `Error` event sent to the caller; none
//! of them tears down the connection or touches other members' state.

use thiserror::Error;

use formpulse_shared::protocol::error_codes;

use crate::domain::{ContentError, StoreError};

/// Why a hub operation was rejected or failed.
#[derive(Debug, Error)]
pub enum HubOperationError {
    #[error("No access to this template")]
    AccessDenied,

    #[error("Authentication required to {action}")]
    AuthRequired { action: &'static str },

    #[error("Join the template group before commenting on it")]
    NotWatching,

    #[error(transparent)]
    InvalidContent(#[from] ContentError),

    /// The invoking connection disappeared mid-operation (raced with its own
    /// disconnect).
    #[error("Connection is no longer registered")]
    ConnectionGone,

    /// A backing-store call failed; `code` is the operation-specific error
    /// code from the wire protocol.
    #[error("{source}")]
    Store {
        code: &'static str,
        source: StoreError,
    },
}

impl HubOperationError {
    pub fn store(code: &'static str, source: StoreError) -> Self {
        Self::Store { code, source }
    }

    /// Machine-readable code carried in the outgoing `Error` event.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AccessDenied => error_codes::ACCESS_DENIED,
            Self::AuthRequired { .. } => error_codes::AUTH_REQUIRED,
            Self::NotWatching => error_codes::NOT_WATCHING,
            Self::InvalidContent(ContentError::Empty) => error_codes::EMPTY_CONTENT,
            Self::InvalidContent(ContentError::TooLong(_)) => error_codes::CONTENT_TOO_LONG,
            Self::ConnectionGone => error_codes::CONNECTION_ERROR,
            Self::Store { code, .. } => code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_match_taxonomy() {
        assert_eq!(HubOperationError::AccessDenied.error_code(), "ACCESS_DENIED");
        assert_eq!(
            HubOperationError::AuthRequired { action: "add comments" }.error_code(),
            "AUTH_REQUIRED"
        );
        assert_eq!(
            HubOperationError::InvalidContent(ContentError::Empty).error_code(),
            "EMPTY_CONTENT"
        );
        assert_eq!(
            HubOperationError::store(
                error_codes::ADD_COMMENT_ERROR,
                StoreError::Unavailable("db down".to_string())
            )
            .error_code(),
            "ADD_COMMENT_ERROR"
        );
    }

    #[test]
    fn test_auth_required_message_names_the_action() {
        let err = HubOperationError::AuthRequired { action: "toggle likes" };
        assert_eq!(err.to_string(), "Authentication required to toggle likes");
    }
}
