//! Fuzz target for the connection state machine
//!
//! # Strategy
//!
//! Arbitrary interleavings of connect, welcome, sends, disconnects, transport
//! drops (current and stale generations) and time passing.
//!
//! # Invariants
//!
//! - Generation never decreases
//! - `send` succeeds only while Connected
//! - A connection id exists only while Connected
//! - A handshake deadline exists only while Connecting
//! - Frames from other generations are never accepted

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use parley_core::connection::{Connection, ConnectionConfig, ConnectionState};
use parley_proto::{payloads::Welcome, ClientFrame, ServerFrame};

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Connect,
    Welcome,
    Send,
    Disconnect,
    TransportClosed { generation_offset: u8 },
    Advance { millis: u16 },
}

fuzz_target!(|ops: Vec<Op>| {
    let mut conn: Connection<Duration> = Connection::new(ConnectionConfig::default());
    let mut now = Duration::ZERO;
    let mut last_generation = conn.generation();

    for op in ops {
        match op {
            Op::Connect => {
                let _ = conn.connect("fuzz", now);
            },
            Op::Welcome => {
                let welcome = ServerFrame::Welcome(Welcome { id: "c1".into() });
                if conn.accepts(conn.generation(), &welcome) {
                    conn.handle_welcome("c1".into()).expect("accepted welcome must apply");
                }
            },
            Op::Send => {
                let sent = conn.send(ClientFrame::typing(true));
                assert_eq!(sent.is_ok(), conn.state() == ConnectionState::Connected);
            },
            Op::Disconnect => {
                let _ = conn.disconnect();
            },
            Op::TransportClosed { generation_offset } => {
                let generation = conn.generation().saturating_sub(u64::from(generation_offset % 3));
                let _ = conn.transport_closed(generation, "fuzz");
            },
            Op::Advance { millis } => {
                now += Duration::from_millis(u64::from(millis));
                let _ = conn.tick(now);
            },
        }

        assert!(conn.generation() >= last_generation);
        last_generation = conn.generation();

        assert_eq!(conn.connection_id().is_some(), conn.state() == ConnectionState::Connected);
        assert_eq!(conn.deadline().is_some(), conn.state() == ConnectionState::Connecting);

        let stale = ServerFrame::Welcome(Welcome { id: "old".into() });
        assert!(!conn.accepts(conn.generation().wrapping_add(1), &stale));
    }
});
