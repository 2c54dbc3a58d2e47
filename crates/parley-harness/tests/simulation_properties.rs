//! Randomized simulation runs.
//!
//! Arbitrary interleavings of typing, sending, leaving, relay drops and time
//! passing. The cluster asserts the standard invariants after every step;
//! the properties below add cross-client expectations.

use std::time::Duration;

use parley_app::KeyInput;
use parley_client::{Permission, SessionMode};
use parley_harness::SimCluster;
use proptest::prelude::*;

const CLIENTS: usize = 3;

#[derive(Debug, Clone)]
enum Op {
    Join(usize),
    Type(usize, char),
    Backspace(usize),
    Send(usize),
    Leave(usize),
    Kick(usize),
    Advance(u64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let client = 0..CLIENTS;
    prop_oneof![
        3 => client.clone().prop_map(Op::Join),
        6 => (client.clone(), prop::char::range('a', 'e')).prop_map(|(c, ch)| Op::Type(c, ch)),
        2 => client.clone().prop_map(Op::Backspace),
        3 => client.clone().prop_map(Op::Send),
        1 => client.clone().prop_map(Op::Leave),
        1 => client.prop_map(Op::Kick),
        3 => (0u64..1_500).prop_map(Op::Advance),
    ]
}

fn apply(cluster: &mut SimCluster, op: &Op) {
    match *op {
        Op::Join(c) => {
            let sim = cluster.client_mut(c);
            if sim.client().mode() == SessionMode::NotJoined && sim.app().username().is_empty() {
                sim.type_text(&format!("user{c}"));
            }
            sim.press(KeyInput::Enter);
        },
        Op::Type(c, ch) => cluster.client_mut(c).press(KeyInput::Char(ch)),
        Op::Backspace(c) => cluster.client_mut(c).press(KeyInput::Backspace),
        Op::Send(c) => cluster.client_mut(c).press(KeyInput::Enter),
        Op::Leave(c) => {
            // Esc on the join screen would quit.
            if cluster.client(c).client().mode() != SessionMode::NotJoined {
                cluster.client_mut(c).press(KeyInput::Esc);
            }
        },
        Op::Kick(c) => {
            if let Some(conn) = cluster.client(c).driver().conn() {
                cluster.with_relay(|relay| relay.kick(conn));
            }
        },
        Op::Advance(ms) => cluster.advance(Duration::from_millis(ms)),
    }
    cluster.settle();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_random_sessions_hold_invariants(
        seed in any::<u64>(),
        duplicate_rate in prop_oneof![Just(0.0), Just(0.5), Just(1.0)],
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let mut cluster = SimCluster::new(seed);
        cluster.with_relay(|relay| relay.set_duplicate_rate(duplicate_rate));
        for _ in 0..CLIENTS {
            cluster.add_client(Permission::Granted);
        }

        for op in &ops {
            apply(&mut cluster, op);
        }

        for c in 0..CLIENTS {
            let sim = cluster.client(c);
            prop_assert!(!sim.has_quit());

            // Alerts only ever name other users.
            let own = format!("user{c}");
            prop_assert!(sim.driver().notifications().iter().all(|n| n.title != own));

            // Settled joined clients agree with the relay on who is here.
            if sim.client().mode() == SessionMode::Joined {
                let relay_users = cluster.with_relay(|relay| relay.users());
                prop_assert_eq!(sim.client().roster().users(), relay_users.as_slice());
            }
        }
    }

    #[test]
    fn prop_typing_stops_after_idle(
        keys in prop::collection::vec(prop::char::range('a', 'z'), 1..20),
        gaps in prop::collection::vec(0u64..700, 1..20),
    ) {
        let mut cluster = SimCluster::new(0);
        let alice = cluster.add_client(Permission::Granted);
        let bob = cluster.add_client(Permission::Granted);
        cluster.join(alice, "alice");
        cluster.join(bob, "bob");

        for (key, gap) in keys.iter().zip(gaps.iter().cycle()) {
            cluster.client_mut(alice).press(KeyInput::Char(*key));
            cluster.settle();
            cluster.advance(Duration::from_millis(*gap));
            prop_assert!(cluster.client(alice).client().is_typing());
        }

        cluster.advance(Duration::from_millis(800));

        prop_assert!(!cluster.client(alice).client().is_typing());
        prop_assert!(cluster.client(bob).client().typing().is_empty());
    }
}
