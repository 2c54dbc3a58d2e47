//! Application side-effects and intents.
//!
//! This module defines the [`AppAction`] enum, which represents instructions
//! produced by the [`crate::App`] state machine for the runtime to execute.

use parley_client::Permission;

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Join the room.
    Join {
        /// Trimmed, non-empty display name.
        username: String,
    },

    /// Leave the room (or abandon a pending join).
    Leave,

    /// The composer text changed and is not empty.
    Keystroke,

    /// Send a chat message.
    SendMessage {
        /// Trimmed, non-empty message text.
        message: String,
    },

    /// The composer became empty.
    ComposerCleared,

    /// The permission prompt was answered.
    ResolvePermission {
        /// The answer.
        permission: Permission,
    },
}

impl AppAction {
    /// Whether the action goes through the [`crate::Bridge`].
    pub fn is_session(&self) -> bool {
        !matches!(self, Self::Render | Self::Quit)
    }
}
