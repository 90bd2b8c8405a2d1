//! Unified error handling for tkellem.
//!
//! Handshake failures are terminal for a connection: each one maps to a
//! single `ERROR` line sent before the socket is closed.

use thiserror::Error;
use tkellem_proto::{Message, ProtocolError};

// ============================================================================
// Bouncer Errors (handshake and routing)
// ============================================================================

/// Errors that end a client connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BouncerError {
    /// Requested backend name is not registered or not live.
    #[error("unknown connection {0}")]
    UnknownConnection(String),

    /// The registry rejected the nick/password pair.
    #[error("bad auth, please check your password")]
    BadAuth,

    /// The backend refused to attach this client identity.
    #[error("unknown client {0}")]
    UnknownClient(String),

    /// A command other than the handshake set arrived before attach.
    #[error("unknown command {0} before authentication")]
    ProtocolViolation(String),
}

impl BouncerError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownConnection(_) => "unknown_connection",
            Self::BadAuth => "bad_auth",
            Self::UnknownClient(_) => "unknown_client",
            Self::ProtocolViolation(_) => "protocol_violation",
        }
    }

    /// The `ERROR :<message>` line sent to the client before closing.
    pub fn to_error_line(&self) -> Message {
        error_line(self.to_string())
    }
}

/// Build a bare `ERROR :<text>` line.
pub fn error_line(text: impl Into<String>) -> Message {
    Message::new("ERROR", Vec::<String>::new()).with_trailing(text)
}

/// Returned by [`crate::ClientHandle`] sends that could not be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    /// The connection task has gone away.
    #[error("client connection closed")]
    Closed,

    /// The client's outbound queue is full.
    #[error("SendQ exceeded")]
    SendQExceeded,
}

// ============================================================================
// Connection Errors (transport)
// ============================================================================

/// Errors raised while driving a client socket.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(BouncerError::BadAuth.error_code(), "bad_auth");
        assert_eq!(
            BouncerError::UnknownConnection("net1".into()).error_code(),
            "unknown_connection"
        );
        assert_eq!(
            BouncerError::ProtocolViolation("JOIN".into()).error_code(),
            "protocol_violation"
        );
    }

    #[test]
    fn test_error_lines() {
        assert_eq!(
            BouncerError::BadAuth.to_error_line().to_string(),
            "ERROR :bad auth, please check your password"
        );
        assert_eq!(
            BouncerError::UnknownConnection("net9".into())
                .to_error_line()
                .to_string(),
            "ERROR :unknown connection net9"
        );
        assert_eq!(
            BouncerError::UnknownClient("laptop".into())
                .to_error_line()
                .to_string(),
            "ERROR :unknown client laptop"
        );
    }
}
