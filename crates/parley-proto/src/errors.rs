//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame could not be serialized.
    #[error("failed to encode frame: {0}")]
    Encode(String),

    /// Text was not a valid frame for this direction.
    #[error("failed to decode frame: {0}")]
    Decode(String),
}
