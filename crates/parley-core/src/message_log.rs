//! Message log.
//!
//! Append-only history for the current session in arrival order, which may
//! differ from timestamp order. Entries are never mutated or removed while
//! the session lasts, and the log has no size bound.
//!
//! # Invariants
//!
//! - Ids are unique. Re-delivery of an id is dropped silently.
//! - `messages()` order is append order.

use std::{collections::HashSet, fmt};

use chrono::{DateTime, Utc};
use parley_proto::payloads::{ChatMessage, SystemMessage};

/// Unique message identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub String);

impl MessageId {
    /// Borrow as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Who wrote a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Author {
    /// Relay notice with no human sender.
    System,
    /// A user, identified by display name.
    User(String),
}

/// How a message is rendered relative to the local user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStyle {
    /// System notice.
    System,
    /// Sent under the local username.
    Mine,
    /// Sent by someone else.
    Other,
}

/// One entry in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Unique id.
    pub id: MessageId,
    /// Author.
    pub author: Author,
    /// Text.
    pub body: String,
    /// Relay timestamp.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Chat message from `sender`.
    pub fn chat(
        id: impl Into<MessageId>,
        sender: impl Into<String>,
        body: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self { id: id.into(), author: Author::User(sender.into()), body: body.into(), timestamp }
    }

    /// System notice.
    pub fn system(
        id: impl Into<MessageId>,
        body: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self { id: id.into(), author: Author::System, body: body.into(), timestamp }
    }

    /// Sender's display name. `None` for system messages.
    pub fn sender(&self) -> Option<&str> {
        match &self.author {
            Author::System => None,
            Author::User(name) => Some(name),
        }
    }

    /// Whether this is a system notice.
    pub fn is_system(&self) -> bool {
        self.author == Author::System
    }

    /// Styling against the local username.
    ///
    /// "Mine" is decided by display name, so two users sharing a name both see
    /// each other's messages as their own.
    pub fn style_for(&self, local_username: Option<&str>) -> MessageStyle {
        match &self.author {
            Author::System => MessageStyle::System,
            Author::User(sender) if Some(sender.as_str()) == local_username => MessageStyle::Mine,
            Author::User(_) => MessageStyle::Other,
        }
    }
}

impl From<ChatMessage> for Message {
    fn from(msg: ChatMessage) -> Self {
        Self::chat(msg.id, msg.sender, msg.message, msg.timestamp)
    }
}

impl From<SystemMessage> for Message {
    fn from(msg: SystemMessage) -> Self {
        Self::system(msg.id, msg.message, msg.timestamp)
    }
}

/// Append-only, de-duplicated message history.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
    ids: HashSet<MessageId>,
}

impl MessageLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `message` at the end.
    ///
    /// Returns `false` (and leaves the log untouched) if the id is already
    /// present.
    pub fn append(&mut self, message: Message) -> bool {
        if !self.ids.insert(message.id.clone()) {
            tracing::debug!(id = %message.id, "duplicate message dropped");
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Messages in arrival order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Whether a message with `id` has been appended.
    pub fn contains(&self, id: &MessageId) -> bool {
        self.ids.contains(id)
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Most recent message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Start over. Only a new join does this.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.ids.clear();
    }
}
