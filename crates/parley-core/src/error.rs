//! Error types for the session core.
//!
//! Strongly-typed connection errors. Transport failures arrive from drivers as
//! strings because the core never sees the transport itself.

use std::time::Duration;

use parley_proto::ProtocolError;
use thiserror::Error;

use crate::connection::ConnectionState;

/// Errors that can occur during connection state machine operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Outbound traffic attempted without an established connection.
    #[error("not connected (state {state:?})")]
    NotConnected {
        /// Current state when the send was attempted
        state: ConnectionState,
    },

    /// Invalid state transition attempted
    #[error("invalid state transition: cannot {operation} from {state:?}")]
    InvalidState {
        /// Current state when error occurred
        state: ConnectionState,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Handshake did not complete within timeout
    #[error("handshake timeout after {elapsed:?}")]
    HandshakeTimeout {
        /// How long we waited
        elapsed: Duration,
    },

    /// Protocol error from frame encoding/decoding
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Underlying transport error
    #[error("transport error: {0}")]
    Transport(String),
}

impl ConnectionError {
    /// Returns true if a manual re-join may succeed.
    ///
    /// Timeouts and transport drops are transient. Protocol violations and
    /// misuse of the state machine are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::HandshakeTimeout { .. } | Self::Transport(_))
    }
}

impl From<ProtocolError> for ConnectionError {
    fn from(err: ProtocolError) -> Self {
        Self::Protocol(err.to_string())
    }
}
