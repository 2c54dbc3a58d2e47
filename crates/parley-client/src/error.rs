//! Client error types.

use parley_core::ConnectionError;
use thiserror::Error;

/// Errors returned by [`crate::Client::handle`].
///
/// Validation errors leave the client untouched and produce no network
/// traffic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Join attempted with a blank username.
    #[error("username must not be empty")]
    EmptyUsername,

    /// Send attempted with a blank message.
    #[error("message must not be empty")]
    EmptyMessage,

    /// Send attempted outside a joined session.
    #[error("not joined")]
    NotJoined,

    /// Connection state machine refused the operation.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl ClientError {
    /// Whether this is a local input validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::EmptyUsername | Self::EmptyMessage | Self::NotJoined)
    }
}
