//! Client events and actions.

use parley_core::notification::{Notification, Permission};
use parley_proto::{ClientFrame, ServerFrame};

/// Coarse session mode.
///
/// `NotJoined --join--> Joining --welcome--> Joined --leave/drop--> NotJoined`.
/// `Joining` may also fall back to `NotJoined`. There is no direct
/// `NotJoined -> Joined` edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    /// No session.
    #[default]
    NotJoined,
    /// `join` sent, waiting for the relay's acknowledgment.
    Joining,
    /// In the room.
    Joined,
}

/// Events the caller feeds into the client.
///
/// The caller is responsible for:
/// - Receiving frames from the network and tagging them with the generation
///   of the transport they came from
/// - Driving time forward via ticks
/// - Forwarding user intents (join, send, keystrokes)
///
/// Generic over `I` (Instant type) to support both production
/// (`std::time::Instant`) and simulated clocks.
#[derive(Debug, Clone)]
pub enum ClientEvent<I = std::time::Instant> {
    /// Process started; `permission` is the notification permission already
    /// known to the platform.
    Started {
        /// Current notification permission.
        permission: Permission,
    },

    /// The permission prompt was answered.
    PermissionResolved {
        /// Resolved permission.
        permission: Permission,
    },

    /// User wants to join under `username`.
    Join {
        /// Requested display name, untrimmed.
        username: String,
    },

    /// User wants to leave.
    Leave,

    /// User edited the composer.
    Keystroke,

    /// User wants to send `message`.
    SendMessage {
        /// Message text, untrimmed.
        message: String,
    },

    /// The composer became empty.
    ComposerCleared,

    /// Frame received from the relay.
    FrameReceived {
        /// Generation of the transport that delivered it.
        generation: u64,
        /// Decoded frame.
        frame: ServerFrame,
    },

    /// Transport dropped (server close, network error).
    TransportClosed {
        /// Generation of the transport that dropped.
        generation: u64,
        /// Human-readable reason.
        reason: String,
    },

    /// Time tick for timeout processing.
    ///
    /// The caller should tick at least as often as
    /// [`crate::Client::next_deadline`] requires.
    Tick {
        /// Current time from the environment.
        now: I,
    },
}

/// Actions the client produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// Open a transport for `generation`.
    Open {
        /// Generation to tag inbound traffic with.
        generation: u64,
    },

    /// Send a frame on the current transport.
    Send(ClientFrame),

    /// Close the transport of `generation`.
    Close {
        /// Generation being closed.
        generation: u64,
    },

    /// Show a local alert.
    Notify(Notification),

    /// Ask the user for notification permission.
    ///
    /// Answer with [`ClientEvent::PermissionResolved`].
    RequestPermission,

    /// Session mode changed.
    SessionChanged {
        /// New mode.
        mode: SessionMode,
    },

    /// Session ended without the user asking (transport drop or handshake
    /// timeout).
    Disconnected {
        /// Why.
        reason: String,
    },
}
