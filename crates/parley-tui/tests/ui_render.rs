//! Rendering tests against ratatui's in-memory backend.

use chrono::Utc;
use parley_app::{App, AppEvent};
use parley_client::{ConnectionState, Message, Notification, SessionMode, SessionView};
use parley_proto::User;
use parley_tui::ui;
use ratatui::{Terminal, backend::TestBackend};

fn draw(app: &App, session: &SessionView<'_>) -> String {
    let mut terminal = Terminal::new(TestBackend::new(80, 16)).unwrap();
    terminal.draw(|frame| ui::render(frame, app, session)).unwrap();

    let buffer = terminal.backend().buffer();
    let width = buffer.area.width as usize;
    let symbols: Vec<&str> = buffer.content().iter().map(|cell| cell.symbol()).collect();
    symbols.chunks(width).map(|row| row.concat()).collect::<Vec<_>>().join("\n")
}

fn joined_app() -> App {
    let mut app = App::with_username("alice");
    app.handle(AppEvent::SessionChanged { mode: SessionMode::Joined });
    app
}

#[test]
fn joined_screen_shows_roster_log_and_typing() {
    let users = [User::new("c1", "alice"), User::new("c2", "bob")];
    let typing = ["bob".to_string()];
    let messages = [
        Message::system("s1", "alice joined", Utc::now()),
        Message::chat("m1", "bob", "hello there", Utc::now()),
    ];
    let session = SessionView {
        mode: SessionMode::Joined,
        connection_state: ConnectionState::Connected,
        username: Some("alice"),
        log_owner: Some("alice"),
        connection_id: Some("c1"),
        users: &users,
        typing: &typing,
        messages: &messages,
    };

    let screen = draw(&joined_app(), &session);

    assert!(screen.contains("alice (you)"));
    assert!(!screen.contains("bob (you)"));
    assert!(screen.contains("Online (2)"));
    assert!(screen.contains("* alice joined"));
    assert!(screen.contains("<bob> hello there"));
    assert!(screen.contains("bob is typing..."));
    assert!(screen.contains("Connected as alice"));
}

#[test]
fn join_screen_shows_username_field_and_status() {
    let mut app = App::with_username("al");
    app.handle(AppEvent::Disconnected { reason: "connection refused".into() });
    let session = SessionView {
        mode: SessionMode::NotJoined,
        connection_state: ConnectionState::Disconnected,
        username: None,
        log_owner: None,
        connection_id: None,
        users: &[],
        typing: &[],
        messages: &[],
    };

    let screen = draw(&app, &session);

    assert!(screen.contains("Username"));
    assert!(screen.contains("> al"));
    assert!(screen.contains("No messages yet"));
    assert!(screen.contains("Disconnected: connection refused"));
}

#[test]
fn alert_banner_replaces_status() {
    let mut app = joined_app();
    app.handle(AppEvent::Notified(Notification { title: "bob".into(), body: "ping".into() }));
    let session = SessionView {
        mode: SessionMode::Joined,
        connection_state: ConnectionState::Connected,
        username: Some("alice"),
        log_owner: Some("alice"),
        connection_id: Some("c1"),
        users: &[],
        typing: &[],
        messages: &[],
    };

    let screen = draw(&app, &session);

    assert!(screen.contains("bob: ping"));
}

#[test]
fn permission_prompt_overlays_join_screen() {
    let mut app = App::new();
    app.handle(AppEvent::PermissionRequested);
    let session = SessionView {
        mode: SessionMode::NotJoined,
        connection_state: ConnectionState::Disconnected,
        username: None,
        log_owner: None,
        connection_id: None,
        users: &[],
        typing: &[],
        messages: &[],
    };

    let screen = draw(&app, &session);
    assert!(screen.contains("Notifications"));
    assert!(screen.contains("[y] yes"));

    app.handle(AppEvent::Key(parley_app::KeyInput::Char('n')));
    let screen = draw(&app, &session);
    assert!(!screen.contains("[y] yes"));
}
