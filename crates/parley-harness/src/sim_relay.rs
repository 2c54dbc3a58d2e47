//! In-process relay double.
//!
//! A single chat room with the same observable contract as the real relay:
//!
//! - `join` is answered with `welcome` to the joiner, then the roster and a
//!   "<name> joined" notice go to everyone joined
//! - `message` is broadcast to everyone joined, sender included, with a fresh
//!   id and the virtual wall-clock timestamp
//! - `typing` updates the sender's flag and broadcasts the typing set, local
//!   user included (filtering is the client's job)
//! - a disconnect broadcasts the new roster, a "<name> left" notice and the
//!   typing set
//!
//! Frames are queued per connection and only move when the owning driver
//! drains them, so delivery order is fully controlled by the simulation.
//! Seeded chaos can duplicate chat deliveries to exercise id deduplication.

use std::{
    collections::{BTreeMap, VecDeque},
    sync::{Arc, Mutex},
};

use parley_proto::{
    ClientFrame, ServerFrame, User,
    payloads::{ChatMessage, Roster, SystemMessage, TypingUpdate, Welcome},
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::sim_env::SimEnv;

/// Relay-side connection handle.
pub type ConnId = u64;

/// Relay shared between the drivers of a simulation.
pub type SharedRelay = Arc<Mutex<SimRelay>>;

#[derive(Debug, Default)]
struct Peer {
    username: Option<String>,
    typing: bool,
    open: bool,
    inbox: VecDeque<ServerFrame>,
}

/// Single-room relay double.
pub struct SimRelay {
    env: SimEnv,
    rng: ChaCha8Rng,
    duplicate_rate: f64,
    mute_welcome: bool,
    peers: BTreeMap<ConnId, Peer>,
    next_conn: ConnId,
    next_event: u64,
}

impl SimRelay {
    /// Relay stamping messages from `env`, with chaos seeded by `seed`.
    pub fn new(env: SimEnv, seed: u64) -> Self {
        Self {
            env,
            rng: ChaCha8Rng::seed_from_u64(seed),
            duplicate_rate: 0.0,
            mute_welcome: false,
            peers: BTreeMap::new(),
            next_conn: 1,
            next_event: 1,
        }
    }

    /// Wrap for sharing between drivers.
    pub fn shared(self) -> SharedRelay {
        Arc::new(Mutex::new(self))
    }

    /// Probability that a chat message is delivered twice to a recipient.
    pub fn set_duplicate_rate(&mut self, rate: f64) {
        self.duplicate_rate = rate.clamp(0.0, 1.0);
    }

    /// Stop answering `join` with `welcome`.
    pub fn set_mute_welcome(&mut self, mute: bool) {
        self.mute_welcome = mute;
    }

    /// Accept a new transport.
    pub fn connect(&mut self) -> ConnId {
        let conn = self.next_conn;
        self.next_conn += 1;
        self.peers.insert(conn, Peer { open: true, ..Peer::default() });
        tracing::trace!(conn, "relay accepted connection");
        conn
    }

    /// Whether `conn` is still open from the relay's side.
    pub fn is_open(&self, conn: ConnId) -> bool {
        self.peers.get(&conn).is_some_and(|peer| peer.open)
    }

    /// Handle a frame written by `conn`.
    pub fn receive(&mut self, conn: ConnId, frame: ClientFrame) {
        let Some(peer) = self.peers.get_mut(&conn).filter(|peer| peer.open) else {
            tracing::trace!(conn, event = frame.event_name(), "frame on closed connection dropped");
            return;
        };

        match frame {
            ClientFrame::Join(join) => {
                peer.username = Some(join.username.clone());
                if !self.mute_welcome {
                    peer.inbox.push_back(ServerFrame::Welcome(Welcome { id: conn.to_string() }));
                }
                self.broadcast_roster();
                self.broadcast_notice(format!("{} joined", join.username));
            },
            ClientFrame::Message(outgoing) => {
                let Some(sender) = peer.username.clone() else {
                    tracing::trace!(conn, "message before join dropped");
                    return;
                };
                let id = self.next_id("msg");
                let frame = ServerFrame::Message(ChatMessage {
                    id,
                    sender,
                    message: outgoing.message,
                    timestamp: self.env.wall_clock(),
                });
                self.broadcast_chat(&frame);
            },
            ClientFrame::Typing(state) => {
                if peer.username.is_none() {
                    return;
                }
                peer.typing = state.is_typing;
                self.broadcast_typing();
            },
        }
    }

    /// Client-initiated close. Forgets `conn`.
    pub fn disconnect(&mut self, conn: ConnId) {
        if let Some(peer) = self.peers.remove(&conn) {
            self.depart(peer);
        }
    }

    /// Relay-initiated drop. Frames already queued stay readable; the owning
    /// driver observes the close once they are drained.
    pub fn kick(&mut self, conn: ConnId) {
        let Some(peer) = self.peers.get_mut(&conn) else { return };
        peer.open = false;
        let departed = Peer {
            username: peer.username.take(),
            typing: std::mem::take(&mut peer.typing),
            ..Peer::default()
        };
        tracing::trace!(conn, "relay dropped connection");
        self.depart(departed);
    }

    /// Next frame queued for `conn`.
    pub fn pop(&mut self, conn: ConnId) -> Option<ServerFrame> {
        self.peers.get_mut(&conn)?.inbox.pop_front()
    }

    /// Whether `conn` has frames waiting.
    pub fn has_pending(&self, conn: ConnId) -> bool {
        self.peers.get(&conn).is_some_and(|peer| !peer.inbox.is_empty())
    }

    /// Queue an arbitrary frame for `conn`, bypassing relay logic.
    pub fn inject(&mut self, conn: ConnId, frame: ServerFrame) {
        if let Some(peer) = self.peers.get_mut(&conn) {
            peer.inbox.push_back(frame);
        }
    }

    /// Joined users in connection order.
    pub fn users(&self) -> Vec<User> {
        self.peers
            .iter()
            .filter(|(_, peer)| peer.open)
            .filter_map(|(conn, peer)| {
                peer.username.as_ref().map(|name| User::new(conn.to_string(), name.clone()))
            })
            .collect()
    }

    fn depart(&mut self, peer: Peer) {
        let Some(username) = peer.username else { return };
        self.broadcast_roster();
        self.broadcast_notice(format!("{username} left"));
        if peer.typing {
            self.broadcast_typing();
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        let id = format!("{prefix}-{}", self.next_event);
        self.next_event += 1;
        id
    }

    fn joined(&mut self) -> impl Iterator<Item = &mut Peer> {
        self.peers.values_mut().filter(|peer| peer.open && peer.username.is_some())
    }

    fn broadcast(&mut self, frame: &ServerFrame) {
        for peer in self.joined() {
            peer.inbox.push_back(frame.clone());
        }
    }

    fn broadcast_chat(&mut self, frame: &ServerFrame) {
        let rate = self.duplicate_rate;
        let conns: Vec<ConnId> = self
            .peers
            .iter()
            .filter(|(_, peer)| peer.open && peer.username.is_some())
            .map(|(conn, _)| *conn)
            .collect();

        for conn in conns {
            let copies = if rate > 0.0 && self.rng.gen_bool(rate) { 2 } else { 1 };
            if let Some(peer) = self.peers.get_mut(&conn) {
                for _ in 0..copies {
                    peer.inbox.push_back(frame.clone());
                }
            }
        }
    }

    fn broadcast_roster(&mut self) {
        let frame = ServerFrame::Roster(Roster { users: self.users() });
        self.broadcast(&frame);
    }

    fn broadcast_notice(&mut self, message: String) {
        let id = self.next_id("sys");
        let frame = ServerFrame::SystemMessage(SystemMessage {
            id,
            message,
            timestamp: self.env.wall_clock(),
        });
        self.broadcast(&frame);
    }

    fn broadcast_typing(&mut self) {
        let usernames = self
            .peers
            .values()
            .filter(|peer| peer.open && peer.typing)
            .filter_map(|peer| peer.username.clone())
            .collect();
        self.broadcast(&ServerFrame::Typing(TypingUpdate { usernames }));
    }
}
