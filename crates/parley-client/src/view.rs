//! Read-only projection of the session for rendering.

use parley_core::{
    connection::ConnectionState,
    message_log::{Message, MessageStyle},
    roster::Roster,
};
use parley_proto::User;

use crate::event::SessionMode;

/// Borrowed snapshot of everything the UI draws.
#[derive(Debug, Clone, Copy)]
pub struct SessionView<'a> {
    /// Session mode.
    pub mode: SessionMode,
    /// Connection state.
    pub connection_state: ConnectionState,
    /// Local username while a session exists.
    pub username: Option<&'a str>,
    /// Username the message log was recorded under. Kept after the session
    /// ends so the retained log keeps its styling.
    pub log_owner: Option<&'a str>,
    /// Relay-assigned connection id.
    pub connection_id: Option<&'a str>,
    /// Roster in push order.
    pub users: &'a [User],
    /// Other users typing.
    pub typing: &'a [String],
    /// Message log in arrival order.
    pub messages: &'a [Message],
}

impl SessionView<'_> {
    /// Styling of `message` for the local user.
    pub fn style(&self, message: &Message) -> MessageStyle {
        message.style_for(self.log_owner)
    }

    /// Whether roster entry `user` is this session.
    pub fn is_me(&self, user: &User) -> bool {
        Roster::is_local(user, self.connection_id)
    }
}
