//! End-to-end session scenarios.
//!
//! Each test drives the production runtime through the simulation cluster.
//! The standard invariants are checked after every step.

use std::time::Duration;

use chrono::Utc;
use parley_app::KeyInput;
use parley_client::{MessageStyle, Notification, Permission, SessionMode};
use parley_core::message_log::MessageId;
use parley_harness::SimCluster;
use parley_proto::{ClientFrame, ServerFrame, User, payloads::ChatMessage};

fn joined_pair() -> SimCluster {
    let mut cluster = SimCluster::new(42);
    let alice = cluster.add_client(Permission::Granted);
    let bob = cluster.add_client(Permission::Granted);
    cluster.join(alice, "alice");
    cluster.join(bob, "bob");
    cluster
}

fn count(frames: &[ClientFrame], frame: &ClientFrame) -> usize {
    frames.iter().filter(|f| *f == frame).count()
}

#[test]
fn join_shows_self_in_roster_and_notice_in_log() {
    let mut cluster = SimCluster::new(1);
    let alice = cluster.add_client(Permission::Granted);

    cluster.join(alice, "alice");

    let client = cluster.client(alice).client();
    assert_eq!(client.mode(), SessionMode::Joined);
    assert_eq!(client.connection_id(), Some("1"));
    assert_eq!(client.roster().users(), &[User::new("1", "alice")]);
    assert_eq!(client.log().len(), 1);
    assert_eq!(client.log().messages()[0].body, "alice joined");
    assert!(client.log().messages()[0].is_system());

    let screen = cluster.client(alice).driver().screen().unwrap();
    assert_eq!(screen.roster, vec!["alice (you)".to_string()]);
    assert_eq!(screen.messages, vec![(MessageStyle::System, "alice joined".to_string())]);
    assert_eq!(screen.status, None);
}

#[test]
fn others_see_join_and_roster() {
    let cluster = joined_pair();

    let alice = cluster.client(0).client();
    assert_eq!(alice.roster().users(), &[User::new("1", "alice"), User::new("2", "bob")]);
    let bodies: Vec<_> = alice.log().messages().iter().map(|m| m.body.as_str()).collect();
    assert_eq!(bodies, vec!["alice joined", "bob joined"]);

    let screen = cluster.client(1).driver().screen().unwrap();
    assert_eq!(screen.roster, vec!["alice".to_string(), "bob (you)".to_string()]);
}

#[test]
fn message_from_other_notifies_exactly_once() {
    let mut cluster = joined_pair();

    cluster.say(1, "hi");

    let alice = cluster.client(0);
    assert_eq!(alice.driver().notifications(), &[Notification {
        title: "bob".into(),
        body: "hi".into(),
    }]);
    assert!(alice.app().alert().is_some());
    let last = alice.client().log().last().unwrap();
    assert_eq!(last.sender(), Some("bob"));
    assert_eq!(alice.client().view().style(last), MessageStyle::Other);

    let bob = cluster.client(1);
    assert!(bob.driver().notifications().is_empty());
    let last = bob.client().log().last().unwrap();
    assert_eq!(bob.client().view().style(last), MessageStyle::Mine);
}

#[test]
fn denied_permission_never_notifies() {
    let mut cluster = SimCluster::new(3);
    let alice = cluster.add_client(Permission::Denied);
    let bob = cluster.add_client(Permission::Granted);
    cluster.join(alice, "alice");
    cluster.join(bob, "bob");

    cluster.say(bob, "hi");

    assert_eq!(cluster.client(alice).driver().prompts(), 0);
    assert!(cluster.client(alice).driver().notifications().is_empty());
    assert_eq!(cluster.client(alice).client().log().len(), 3);
}

#[test]
fn undecided_permission_prompts_once_at_startup() {
    let mut cluster = SimCluster::new(4);
    let alice = cluster.add_client(Permission::Default);
    let bob = cluster.add_client(Permission::Granted);

    assert_eq!(cluster.client(alice).driver().prompts(), 1);
    assert_eq!(cluster.client(bob).driver().prompts(), 0);
    assert!(cluster.client(alice).driver().screen().unwrap().prompt);
    assert_eq!(cluster.client(alice).client().permission(), Permission::Default);

    cluster.client_mut(alice).press(KeyInput::Char('y'));
    cluster.settle();
    assert_eq!(cluster.client(alice).client().permission(), Permission::Granted);
    assert!(!cluster.client(alice).driver().screen().unwrap().prompt);

    cluster.join(alice, "alice");
    cluster.join(bob, "bob");
    cluster.say(bob, "hi");

    assert_eq!(cluster.client(alice).driver().prompts(), 1);
    assert_eq!(cluster.client(alice).driver().notifications().len(), 1);
}

#[test]
fn open_prompt_does_not_stall_the_loop() {
    let mut cluster = SimCluster::new(9);
    let alice = cluster.add_client(Permission::Default);
    let bob = cluster.add_client(Permission::Granted);
    cluster.join(bob, "bob");

    // Time and relay traffic keep flowing while the question is open.
    cluster.advance(Duration::from_secs(2));
    cluster.say(bob, "hi");
    assert!(cluster.client(alice).app().is_prompting());
    assert_eq!(cluster.client(alice).client().permission(), Permission::Default);

    cluster.client_mut(alice).press(KeyInput::Char('n'));
    cluster.settle();
    cluster.join(alice, "alice");
    cluster.say(bob, "again");

    let sim = cluster.client(alice);
    assert_eq!(sim.client().permission(), Permission::Denied);
    assert_eq!(sim.client().mode(), SessionMode::Joined);
    assert!(sim.driver().notifications().is_empty());
    assert_eq!(sim.driver().prompts(), 1);
}

#[test]
fn typing_burst_sends_one_pair() {
    let mut cluster = joined_pair();

    cluster.client_mut(0).type_text("he");
    cluster.settle();

    let sent = cluster.client(0).driver().sent();
    assert_eq!(count(sent, &ClientFrame::typing(true)), 1);
    assert_eq!(count(sent, &ClientFrame::typing(false)), 0);
    assert!(cluster.client(0).client().is_typing());
    assert!(cluster.client(0).client().typing().is_empty());
    assert_eq!(cluster.client(1).client().typing().usernames(), &["alice".to_string()]);

    cluster.advance(Duration::from_millis(799));
    assert_eq!(count(cluster.client(0).driver().sent(), &ClientFrame::typing(false)), 0);

    cluster.advance(Duration::from_millis(1));
    let sent = cluster.client(0).driver().sent();
    assert_eq!(count(sent, &ClientFrame::typing(true)), 1);
    assert_eq!(count(sent, &ClientFrame::typing(false)), 1);
    assert!(cluster.client(1).client().typing().is_empty());
}

#[test]
fn keystrokes_extend_the_idle_window() {
    let mut cluster = joined_pair();

    cluster.client_mut(0).type_text("a");
    cluster.settle();
    cluster.advance(Duration::from_millis(500));
    cluster.client_mut(0).type_text("b");
    cluster.settle();
    cluster.advance(Duration::from_millis(500));

    assert!(cluster.client(0).client().is_typing());

    cluster.advance(Duration::from_millis(300));
    assert!(!cluster.client(0).client().is_typing());
    assert_eq!(count(cluster.client(0).driver().sent(), &ClientFrame::typing(true)), 1);
}

#[test]
fn sending_stops_typing_immediately() {
    let mut cluster = joined_pair();

    cluster.say(0, "hi");

    assert_eq!(cluster.client(0).driver().sent(), &[
        ClientFrame::join("alice"),
        ClientFrame::typing(true),
        ClientFrame::message("hi"),
        ClientFrame::typing(false),
    ]);
    assert!(cluster.client(0).app().composer().is_empty());
}

#[test]
fn clearing_the_composer_stops_typing() {
    let mut cluster = joined_pair();

    cluster.client_mut(0).type_text("x");
    cluster.client_mut(0).press(KeyInput::Backspace);
    cluster.settle();

    let sent = cluster.client(0).driver().sent();
    assert_eq!(count(sent, &ClientFrame::typing(true)), 1);
    assert_eq!(count(sent, &ClientFrame::typing(false)), 1);
    assert!(cluster.client(1).client().typing().is_empty());
}

#[test]
fn blank_message_is_not_sent() {
    let mut cluster = joined_pair();
    let before = cluster.client(0).driver().sent().len();

    cluster.client_mut(0).press(KeyInput::Enter);
    cluster.settle();

    assert_eq!(cluster.client(0).driver().sent().len(), before);
}

#[test]
fn forced_disconnect_clears_live_state_and_keeps_log() {
    let mut cluster = joined_pair();
    cluster.say(0, "brb");
    cluster.client_mut(1).type_text("x");
    cluster.settle();
    assert_eq!(cluster.client(0).client().typing().usernames(), &["bob".to_string()]);
    let log_len = cluster.client(0).client().log().len();

    let conn = cluster.client(0).driver().conn().unwrap();
    cluster.with_relay(|relay| relay.kick(conn));
    cluster.settle();

    let alice = cluster.client(0);
    assert_eq!(alice.client().mode(), SessionMode::NotJoined);
    assert!(alice.client().roster().is_empty());
    assert!(alice.client().typing().is_empty());
    assert!(!alice.client().is_typing());
    assert_eq!(alice.client().log().len(), log_len);
    assert_eq!(alice.app().status_message(), Some("Disconnected: connection dropped by relay"));

    // The kept log still shows alice's own lines as hers.
    let screen = alice.driver().screen().unwrap();
    assert!(screen.messages.contains(&(MessageStyle::Mine, "alice: brb".to_string())));

    let bob = cluster.client(1).client();
    assert_eq!(bob.roster().users(), &[User::new("2", "bob")]);
    assert_eq!(bob.log().last().unwrap().body, "alice left");
}

#[test]
fn rejoin_after_disconnect_starts_a_fresh_log() {
    let mut cluster = joined_pair();
    let conn = cluster.client(0).driver().conn().unwrap();
    cluster.with_relay(|relay| relay.kick(conn));
    cluster.settle();

    // The username field still holds "alice".
    cluster.client_mut(0).press(KeyInput::Enter);
    cluster.settle();

    let alice = cluster.client(0).client();
    assert_eq!(alice.mode(), SessionMode::Joined);
    assert_eq!(alice.generation(), 3);
    assert_eq!(alice.connection_id(), Some("3"));
    let bodies: Vec<_> = alice.log().messages().iter().map(|m| m.body.as_str()).collect();
    assert_eq!(bodies, vec!["alice joined"]);
    assert_eq!(alice.roster().len(), 2);
}

#[test]
fn leaving_announces_departure() {
    let mut cluster = joined_pair();

    cluster.client_mut(0).press(KeyInput::Esc);
    cluster.settle();

    let alice = cluster.client(0);
    assert_eq!(alice.client().mode(), SessionMode::NotJoined);
    assert!(alice.driver().conn().is_none());
    assert!(!alice.has_quit());

    let bob = cluster.client(1).client();
    assert_eq!(bob.roster().users(), &[User::new("2", "bob")]);
    assert_eq!(bob.log().last().unwrap().body, "alice left");
}

#[test]
fn duplicate_ids_are_logged_once() {
    let mut cluster = joined_pair();
    let before = cluster.client(0).client().log().len();
    let frame = ServerFrame::Message(ChatMessage {
        id: "dup-1".into(),
        sender: "bob".into(),
        message: "hey".into(),
        timestamp: Utc::now(),
    });

    let conn = cluster.client(0).driver().conn().unwrap();
    cluster.with_relay(|relay| {
        relay.inject(conn, frame.clone());
        relay.inject(conn, frame);
    });
    cluster.settle();

    let alice = cluster.client(0);
    assert_eq!(alice.client().log().len(), before + 1);
    assert!(alice.client().log().contains(&MessageId::from("dup-1")));
    assert_eq!(alice.driver().notifications().len(), 1);
}

#[test]
fn duplicated_deliveries_are_deduplicated() {
    let mut cluster = joined_pair();
    cluster.with_relay(|relay| relay.set_duplicate_rate(1.0));
    let before = cluster.client(0).client().log().len();

    cluster.say(1, "hi");
    cluster.say(1, "again");

    assert_eq!(cluster.client(0).client().log().len(), before + 2);
    assert_eq!(cluster.client(0).driver().notifications().len(), 2);
}

#[test]
fn handshake_timeout_resets_the_session() {
    let mut cluster = SimCluster::new(5);
    let alice = cluster.add_client(Permission::Granted);
    cluster.with_relay(|relay| relay.set_mute_welcome(true));

    cluster.join(alice, "alice");
    assert_eq!(cluster.client(alice).client().mode(), SessionMode::Joining);
    assert_eq!(cluster.client(alice).app().status_message(), Some("Joining as alice..."));

    cluster.advance(Duration::from_millis(9_900));
    assert_eq!(cluster.client(alice).client().mode(), SessionMode::Joining);

    cluster.advance(Duration::from_millis(100));
    let sim = cluster.client(alice);
    assert_eq!(sim.client().mode(), SessionMode::NotJoined);
    assert!(sim.driver().conn().is_none());
    assert!(
        sim.app()
            .status_message()
            .is_some_and(|s| s.starts_with("Disconnected: handshake timeout"))
    );
}

#[test]
fn refused_connection_reports_disconnect() {
    let mut cluster = SimCluster::new(6);
    let alice = cluster.add_client_with(|driver| {
        let mut driver = driver.with_permission(Permission::Granted);
        driver.set_refuse_connections(true);
        driver
    });

    cluster.join(alice, "alice");

    let sim = cluster.client(alice);
    assert_eq!(sim.client().mode(), SessionMode::NotJoined);
    assert_eq!(sim.app().status_message(), Some("Disconnected: connection refused"));
}

#[test]
fn leave_while_joining_cancels_the_handshake() {
    let mut cluster = SimCluster::new(7);
    let alice = cluster.add_client(Permission::Granted);
    cluster.with_relay(|relay| relay.set_mute_welcome(true));
    cluster.join(alice, "alice");

    cluster.client_mut(alice).press(KeyInput::Esc);
    cluster.settle();
    cluster.advance(Duration::from_secs(11));

    let sim = cluster.client(alice);
    assert_eq!(sim.client().mode(), SessionMode::NotJoined);
    assert_eq!(sim.app().status_message(), None);
}

#[test]
fn interrupt_quits_and_closes_transport() {
    let mut cluster = joined_pair();

    cluster.client_mut(0).press(KeyInput::Interrupt);
    cluster.settle();

    assert!(cluster.client(0).has_quit());
    assert!(cluster.client(0).driver().conn().is_none());
    assert_eq!(cluster.client(1).client().log().last().unwrap().body, "alice left");
}
