//! Client configuration.

use std::time::Duration;

use parley_core::{connection::ConnectionConfig, typing::DEFAULT_TYPING_IDLE};

/// Tunables for a [`crate::Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Connection handshake settings.
    pub connection: ConnectionConfig,
    /// Quiet period before `typing=false` is sent.
    pub typing_idle: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { connection: ConnectionConfig::default(), typing_idle: DEFAULT_TYPING_IDLE }
    }
}
