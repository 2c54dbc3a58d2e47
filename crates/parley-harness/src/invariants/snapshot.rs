//! Observable state snapshots for invariant checking.
//!
//! Snapshots copy what a session exposes at one point in time, so a check
//! never observes a half-applied event.

use parley_client::{Client, ConnectionState, Environment, SessionMode, SessionView};
use parley_core::message_log::MessageId;
use parley_proto::User;

/// Snapshot of every simulated client.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// Per-client state snapshots.
    pub clients: Vec<SessionSnapshot>,
}

impl SystemSnapshot {
    /// Create an empty snapshot (no clients).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a snapshot from multiple clients.
    pub fn from_clients(clients: Vec<SessionSnapshot>) -> Self {
        Self { clients }
    }
}

/// Snapshot of a single client's observable state.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// Client index within the simulation.
    pub id: usize,
    /// Session mode.
    pub mode: SessionMode,
    /// Connection state.
    pub connection_state: ConnectionState,
    /// Local username while a session exists.
    pub username: Option<String>,
    /// Roster in push order.
    pub roster: Vec<User>,
    /// Usernames shown as typing.
    pub typing: Vec<String>,
    /// Ids of every logged message, in order.
    pub message_ids: Vec<MessageId>,
    /// Whether the local user is currently advertised as typing.
    pub local_typing: bool,
}

impl SessionSnapshot {
    /// Capture a rendered view. The local typing flag is not part of the view.
    pub fn from_view(id: usize, view: &SessionView<'_>) -> Self {
        Self {
            id,
            mode: view.mode,
            connection_state: view.connection_state,
            username: view.username.map(str::to_owned),
            roster: view.users.to_vec(),
            typing: view.typing.to_vec(),
            message_ids: view.messages.iter().map(|m| m.id.clone()).collect(),
            local_typing: false,
        }
    }

    /// Capture the full state of a live client.
    pub fn from_client<E: Environment>(id: usize, client: &Client<E>) -> Self {
        Self { local_typing: client.is_typing(), ..Self::from_view(id, &client.view()) }
    }
}
