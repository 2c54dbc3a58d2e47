//! Fuzz target for the client session state machine
//!
//! # Strategy
//!
//! Arbitrary sequences of user intents, relay frames (for the current or a
//! stale generation), transport drops and time passing, fed straight into
//! `Client::handle` on a virtual clock.
//!
//! # Invariants
//!
//! - `handle` never panics; rejected input returns an error
//! - Session mode always matches the connection state
//! - The local user never shows up in the typing set
//! - Message ids in the log are unique
//! - Not joined means no username, roster, typing or outbound typing burst
//! - Alerts never name the local user

#![no_main]

use std::{
    collections::HashSet,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use arbitrary::Arbitrary;
use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;
use parley_client::{
    Client, ClientAction, ClientConfig, ClientEvent, ConnectionState, Environment, Permission,
    SessionMode,
};
use parley_proto::{
    ServerFrame, User,
    payloads::{ChatMessage, Roster, SystemMessage, TypingUpdate, Welcome},
};

/// Virtual clock measured from zero.
#[derive(Clone, Default)]
struct FuzzEnv {
    millis: Arc<AtomicU64>,
}

impl FuzzEnv {
    fn advance(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Environment for FuzzEnv {
    type Instant = Duration;

    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX));
    }
}

const NAMES: [&str; 3] = ["alice", "bob", "carol"];

#[derive(Debug, Clone, Copy, Arbitrary)]
enum FuzzPermission {
    Default,
    Granted,
    Denied,
    Unsupported,
}

impl From<FuzzPermission> for Permission {
    fn from(p: FuzzPermission) -> Self {
        match p {
            FuzzPermission::Default => Self::Default,
            FuzzPermission::Granted => Self::Granted,
            FuzzPermission::Denied => Self::Denied,
            FuzzPermission::Unsupported => Self::Unsupported,
        }
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum Frame {
    Welcome { id: u8 },
    Roster { members: Vec<(u8, u8)> },
    Message { id: u8, sender: u8, body: String },
    System { id: u8, body: String },
    Typing { users: Vec<u8> },
}

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Start(FuzzPermission),
    Resolve(FuzzPermission),
    Join { name: u8, padded: bool },
    Leave,
    Keystroke,
    Send(String),
    Clear,
    Frame { stale: bool, frame: Frame },
    Drop { stale: bool },
    Advance { millis: u16 },
}

fn name(index: u8) -> &'static str {
    NAMES[usize::from(index) % NAMES.len()]
}

fn server_frame(frame: Frame) -> ServerFrame {
    let timestamp = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_default();
    match frame {
        Frame::Welcome { id } => ServerFrame::Welcome(Welcome { id: format!("c{}", id % 4) }),
        Frame::Roster { members } => ServerFrame::Roster(Roster {
            users: members
                .into_iter()
                .take(8)
                .map(|(id, n)| User::new(format!("c{}", id % 4), name(n)))
                .collect(),
        }),
        Frame::Message { id, sender, body } => ServerFrame::Message(ChatMessage {
            id: format!("m{}", id % 8),
            sender: name(sender).to_string(),
            message: body,
            timestamp,
        }),
        Frame::System { id, body } => ServerFrame::SystemMessage(SystemMessage {
            id: format!("s{}", id % 8),
            message: body,
            timestamp,
        }),
        Frame::Typing { users } => ServerFrame::Typing(TypingUpdate {
            usernames: users.into_iter().take(8).map(|n| name(n).to_string()).collect(),
        }),
    }
}

fn check(client: &Client<FuzzEnv>, actions: &[ClientAction]) {
    let expected = match client.mode() {
        SessionMode::NotJoined => ConnectionState::Disconnected,
        SessionMode::Joining => ConnectionState::Connecting,
        SessionMode::Joined => ConnectionState::Connected,
    };
    assert_eq!(client.connection_state(), expected);

    if let Some(username) = client.username() {
        assert!(!client.typing().contains(username), "local user in typing set");
    }

    let mut seen = HashSet::new();
    for message in client.log().messages() {
        assert!(seen.insert(&message.id), "duplicate message id {:?}", message.id);
    }

    if client.mode() == SessionMode::NotJoined {
        assert!(client.username().is_none());
        assert!(client.roster().is_empty());
        assert!(client.typing().is_empty());
        assert!(!client.is_typing());
    }

    for action in actions {
        if let ClientAction::Notify(notification) = action {
            assert_ne!(Some(notification.title.as_str()), client.username());
        }
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let env = FuzzEnv::default();
    let mut client = Client::new(env.clone(), ClientConfig::default());

    for op in ops.into_iter().take(256) {
        let event = match op {
            Op::Start(p) => ClientEvent::Started { permission: p.into() },
            Op::Resolve(p) => ClientEvent::PermissionResolved { permission: p.into() },
            Op::Join { name: n, padded } => {
                let username =
                    if padded { format!("  {}  ", name(n)) } else { name(n).to_string() };
                ClientEvent::Join { username }
            },
            Op::Leave => ClientEvent::Leave,
            Op::Keystroke => ClientEvent::Keystroke,
            Op::Send(message) => ClientEvent::SendMessage { message },
            Op::Clear => ClientEvent::ComposerCleared,
            Op::Frame { stale, frame } => ClientEvent::FrameReceived {
                generation: client.generation().saturating_sub(u64::from(stale)),
                frame: server_frame(frame),
            },
            Op::Drop { stale } => ClientEvent::TransportClosed {
                generation: client.generation().saturating_sub(u64::from(stale)),
                reason: "fuzz".into(),
            },
            Op::Advance { millis } => {
                env.advance(u64::from(millis));
                ClientEvent::Tick { now: env.now() }
            },
        };

        let actions = client.handle(event).unwrap_or_default();
        check(&client, &actions);
    }
});
