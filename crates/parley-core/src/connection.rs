//! Connection Manager state machine.
//!
//! Owns the lifecycle of the single relay connection and is the only place
//! outbound frames are produced. Uses the action pattern: methods take time as
//! input and return actions for the driver to execute.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────┐ connect  ┌────────────┐  welcome   ┌───────────┐
//! │ Disconnected │─────────>│ Connecting │───────────>│ Connected │
//! └──────────────┘          └────────────┘            └───────────┘
//!        ↑                        │                         │
//!        │ disconnect / drop /    │                         │ disconnect /
//!        │ handshake timeout      │                         │ transport drop
//!        └────────────────────────┴─────────────────────────┘
//! ```
//!
//! # Generations
//!
//! Every connect and every disconnect bumps a generation counter. Drivers tag
//! inbound traffic with the generation of the transport that produced it, and
//! [`Connection::accepts`] refuses any other generation. Frames still in
//! flight when `disconnect` runs are therefore dropped instead of mutating a
//! session that no longer exists.

use std::time::Duration;

use parley_proto::{ClientFrame, ServerFrame};

use crate::{env::Moment, error::ConnectionError};

/// Time allowed between opening the transport and receiving `welcome`.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Actions returned by the connection state machine.
///
/// The driver executes these in order:
/// - `Open`: establish a new transport tagged with `generation`
/// - `Send`: encode and write the frame on the current transport
/// - `Close`: tear down the transport of `generation`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Open a fresh transport.
    Open {
        /// Generation inbound traffic from this transport must carry.
        generation: u64,
    },

    /// Send this frame to the relay.
    Send(ClientFrame),

    /// Close the transport.
    Close {
        /// Generation of the transport being closed.
        generation: u64,
        /// Reason for closing.
        reason: String,
    },
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No transport.
    #[default]
    Disconnected,
    /// Transport requested and `join` sent, waiting for `welcome`.
    Connecting,
    /// `welcome` received; the relay knows our identity.
    Connected,
}

/// Connection configuration
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Timeout for completing the handshake
    pub handshake_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self { handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT }
    }
}

/// Connection Manager.
///
/// Pure state machine. Generic over the instant type so simulation can drive
/// virtual time.
#[derive(Debug, Clone)]
pub struct Connection<I> {
    /// Current state
    state: ConnectionState,
    /// Configuration
    config: ConnectionConfig,
    /// Generation of the current (or most recent) transport
    generation: u64,
    /// Connection id assigned by the relay in `welcome`
    connection_id: Option<String>,
    /// When the pending handshake times out. `Some` only while Connecting.
    handshake_deadline: Option<I>,
    /// When the pending handshake started. `Some` only while Connecting.
    handshake_started: Option<I>,
}

impl<I: Moment> Connection<I> {
    /// Create a new connection in [`ConnectionState::Disconnected`].
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            config,
            generation: 0,
            connection_id: None,
            handshake_deadline: None,
            handshake_started: None,
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether the handshake has completed.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Connection id assigned by the relay. `None` unless Connected.
    pub fn connection_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }

    /// Generation of the current transport.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Pending handshake deadline, if any.
    pub fn deadline(&self) -> Option<I> {
        self.handshake_deadline
    }

    /// Establish the connection and identify as `username`.
    ///
    /// - Disconnected: opens a new transport and sends `join`.
    /// - Connecting: no-op, the join is already in flight.
    /// - Connected: re-sends `join` so the relay refreshes our identity.
    pub fn connect(&mut self, username: &str, now: I) -> Vec<ConnectionAction> {
        match self.state {
            ConnectionState::Disconnected => {
                self.generation += 1;
                self.state = ConnectionState::Connecting;
                self.handshake_started = Some(now);
                self.handshake_deadline = Some(now + self.config.handshake_timeout);

                tracing::debug!(generation = self.generation, "connecting");

                vec![
                    ConnectionAction::Open { generation: self.generation },
                    ConnectionAction::Send(ClientFrame::join(username)),
                ]
            },
            ConnectionState::Connecting => vec![],
            ConnectionState::Connected => vec![ConnectionAction::Send(ClientFrame::join(username))],
        }
    }

    /// Whether an inbound frame from `generation` may be processed.
    ///
    /// Only the current generation is accepted. While Connecting, only the
    /// `welcome` acknowledgment gets through.
    pub fn accepts(&self, generation: u64, frame: &ServerFrame) -> bool {
        if generation != self.generation {
            return false;
        }

        match self.state {
            ConnectionState::Connected => true,
            ConnectionState::Connecting => matches!(frame, ServerFrame::Welcome(_)),
            ConnectionState::Disconnected => false,
        }
    }

    /// Complete the handshake with the relay-assigned connection id.
    ///
    /// A repeated `welcome` while Connected (after a re-sent `join`) only
    /// refreshes the id.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` if Disconnected
    pub fn handle_welcome(&mut self, connection_id: String) -> Result<(), ConnectionError> {
        match self.state {
            ConnectionState::Disconnected => Err(ConnectionError::InvalidState {
                state: self.state,
                operation: "handle_welcome",
            }),
            ConnectionState::Connecting | ConnectionState::Connected => {
                tracing::debug!(generation = self.generation, %connection_id, "connected");
                self.state = ConnectionState::Connected;
                self.connection_id = Some(connection_id);
                self.handshake_deadline = None;
                self.handshake_started = None;
                Ok(())
            },
        }
    }

    /// Route an outbound frame through the connection.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::NotConnected` unless Connected
    pub fn send(&self, frame: ClientFrame) -> Result<ConnectionAction, ConnectionError> {
        if self.state != ConnectionState::Connected {
            return Err(ConnectionError::NotConnected { state: self.state });
        }
        Ok(ConnectionAction::Send(frame))
    }

    /// Tear down the connection. No-op when already Disconnected.
    pub fn disconnect(&mut self) -> Vec<ConnectionAction> {
        if self.state == ConnectionState::Disconnected {
            return vec![];
        }

        let closing = self.generation;
        self.reset();
        tracing::debug!(generation = closing, "disconnected");

        vec![ConnectionAction::Close { generation: closing, reason: "client disconnect".into() }]
    }

    /// Record that the transport of `generation` dropped.
    ///
    /// Returns `true` if this changed state. Drops for stale generations, or
    /// while already Disconnected, are ignored.
    pub fn transport_closed(&mut self, generation: u64, reason: &str) -> bool {
        if generation != self.generation || self.state == ConnectionState::Disconnected {
            return false;
        }

        tracing::warn!(generation, %reason, "transport dropped");
        self.reset();
        true
    }

    /// Elapsed handshake time, if the handshake deadline has passed.
    pub fn check_timeout(&self, now: I) -> Option<Duration> {
        match (self.handshake_started, self.handshake_deadline) {
            (Some(started), Some(deadline)) if now >= deadline => Some(now - started),
            _ => None,
        }
    }

    /// Process periodic maintenance (handshake timeout).
    ///
    /// Returns `Close` when the handshake timed out; the connection is then
    /// Disconnected.
    pub fn tick(&mut self, now: I) -> Vec<ConnectionAction> {
        let Some(elapsed) = self.check_timeout(now) else {
            return vec![];
        };

        let closing = self.generation;
        let reason = ConnectionError::HandshakeTimeout { elapsed }.to_string();
        tracing::warn!(generation = closing, %reason, "handshake abandoned");
        self.reset();

        vec![ConnectionAction::Close { generation: closing, reason }]
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.state = ConnectionState::Disconnected;
        self.connection_id = None;
        self.handshake_deadline = None;
        self.handshake_started = None;
    }
}
