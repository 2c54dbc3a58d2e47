//! Payload types carried by [`crate::ClientFrame`] and [`crate::ServerFrame`].
//!
//! Field names are camelCase on the wire to match the relay's JSON contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Roster entry: one connected user.
///
/// `id` is stable for the lifetime of that user's connection. Usernames are
/// not guaranteed unique across connections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    /// Connection-scoped identifier assigned by the relay.
    pub id: String,
    /// Display name chosen at join.
    pub username: String,
}

impl User {
    /// Create a roster entry.
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self { id: id.into(), username: username.into() }
    }
}

/// Request to join under a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Join {
    /// Requested display name.
    pub username: String,
}

/// Chat message sent by the local user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Message text (already trimmed).
    pub message: String,
}

/// Local typing-state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingState {
    /// Whether the local user is currently typing.
    pub is_typing: bool,
}

/// Handshake acknowledgment carrying the relay-assigned connection id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Welcome {
    /// Connection id for this session.
    pub id: String,
}

/// Full roster replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    /// Every user the relay currently reports as connected.
    pub users: Vec<User>,
}

/// Chat message relayed from a user (the local user included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message id.
    pub id: String,
    /// Sender's display name.
    pub sender: String,
    /// Message text.
    pub message: String,
    /// Relay timestamp.
    pub timestamp: DateTime<Utc>,
}

/// Relay notice with no human sender (join, leave, connection notices).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMessage {
    /// Unique message id.
    pub id: String,
    /// Notice text.
    pub message: String,
    /// Relay timestamp.
    pub timestamp: DateTime<Utc>,
}

/// Current set of users typing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingUpdate {
    /// Display names of everyone the relay considers typing.
    pub usernames: Vec<String>,
}
