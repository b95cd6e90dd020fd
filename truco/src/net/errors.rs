//! Protocol error types for decoding and encoding wire messages.

use thiserror::Error;

/// Errors that can occur while reading or writing a JSON frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame was not a valid message
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Frame size exceeded maximum allowed
    #[error("message size {actual} exceeds maximum {max}")]
    MessageTooLarge { actual: usize, max: usize },

    /// The message named a room other than the connection's
    #[error("message targets room {requested}, connection is in {actual}")]
    RoomMismatch { requested: String, actual: String },
}

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
