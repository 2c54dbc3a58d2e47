//! Application input events.
//!
//! This module defines [`AppEvent`], the set of inputs that drive the
//! [`crate::App`] state machine.
//!
//! Events originate from two distinct sources:
//! - User interactions (keyboard, resize) and system ticks.
//! - Session notifications translated from the underlying client.

use parley_client::{Notification, SessionMode};

use crate::KeyInput;

/// Events processed by the App state machine.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Keyboard input.
    Key(KeyInput),

    /// Periodic tick.
    Tick,

    /// Terminal resize (columns, rows).
    Resize(u16, u16),

    /// Session mode changed.
    SessionChanged {
        /// New mode.
        mode: SessionMode,
    },

    /// Roster, typing set or log changed.
    SessionUpdated,

    /// Session dropped without the user asking.
    Disconnected {
        /// Why.
        reason: String,
    },

    /// The session wants notification permission; show the prompt.
    PermissionRequested,

    /// A local alert was raised.
    Notified(Notification),

    /// Error occurred.
    Error {
        /// Error description.
        message: String,
    },
}
