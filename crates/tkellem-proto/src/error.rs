//! Error types for IRC framing and parsing.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid UTF-8 bytes in a line.
    #[error("invalid UTF-8 in message at byte {byte_pos}")]
    InvalidUtf8 {
        /// Byte position where UTF-8 validation failed.
        byte_pos: usize,
    },

    /// Line exceeded the maximum allowed length.
    #[error("message too long: {actual} bytes (limit: {limit})")]
    MessageTooLong {
        /// Actual line length.
        actual: usize,
        /// Maximum allowed length.
        limit: usize,
    },

    /// Illegal control character inside a line.
    #[error("illegal control character: {0:?}")]
    IllegalControlChar(char),

    /// Failed to parse an IRC message.
    #[error("invalid message: {string}")]
    InvalidMessage {
        /// The invalid message string.
        string: String,
        /// The underlying parse error.
        #[source]
        cause: MessageParseError,
    },
}

impl ProtocolError {
    /// Whether the connection can keep going after this error.
    ///
    /// Over-long lines are dropped; everything else means the stream can no
    /// longer be trusted.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MessageTooLong { .. })
    }
}

/// Errors encountered when parsing a single IRC line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Line was empty (or only whitespace).
    #[error("empty message")]
    EmptyMessage,

    /// Command token was missing or malformed.
    #[error("invalid command")]
    InvalidCommand,

    /// Parser stopped at the given byte offset.
    #[error("parse error at position {position}")]
    ParseContext {
        /// Byte offset into the line.
        position: usize,
    },
}
