//! Client-side error types.

use thiserror::Error;

/// Why a client operation could not be carried out.
#[derive(Debug, Error)]
pub enum ClientError {
    /// An invocation was attempted while the connection is not established.
    /// Nothing is queued; the caller retries after reconnecting.
    #[error("Not connected to the hub")]
    NotConnected,

    /// An operation needed a watched template and there is none.
    #[error("Not watching any template")]
    NotWatching,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}
