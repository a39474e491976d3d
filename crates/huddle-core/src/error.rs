//! Error types for backend requests.
//!
//! Every failure the chat core can observe is a request failure. None of them
//! escape the session: the controller converts each into a local state
//! transition (empty directory, failed room, removed provisional message).

use thiserror::Error;

/// Errors produced by a [`crate::ChatApi`] call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Connection could not be established or was interrupted.
    #[error("transport error: {0}")]
    Transport(String),

    /// Request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Server replied with a non-success status.
    #[error("HTTP {status} from {url}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Request URL.
        url: String,
    },

    /// Credential missing, expired or revoked (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// Room or resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Response body was not the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
}

impl ChatError {
    /// Returns true if the same request may succeed when retried.
    ///
    /// Nothing in the core retries automatically; this only informs logging
    /// and callers that offer a manual retry.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout => true,
            Self::Http { status, .. } => *status >= 500,
            Self::Unauthorized | Self::NotFound(_) | Self::Decode(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_errors_are_transient() {
        assert!(ChatError::Transport("reset".into()).is_transient());
        assert!(ChatError::Timeout.is_transient());
        assert!(ChatError::Http { status: 503, url: "/chat/rooms".into() }.is_transient());
    }

    #[test]
    fn client_errors_are_not_transient() {
        assert!(!ChatError::Http { status: 422, url: "/chat/rooms/1/messages".into() }
            .is_transient());
        assert!(!ChatError::Unauthorized.is_transient());
        assert!(!ChatError::NotFound("room 9".into()).is_transient());
        assert!(!ChatError::Decode("missing field `id`".into()).is_transient());
    }
}
