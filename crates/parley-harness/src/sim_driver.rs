//! Simulation driver for deterministic testing.
//!
//! Implements [`Driver`] over scripted input and a [`SharedRelay`]. Time never
//! passes inside the driver: an empty input queue answers `poll_input`
//! immediately, and the simulation moves the shared [`SimEnv`] clock itself.

use std::{
    collections::VecDeque,
    convert::Infallible,
    sync::{MutexGuard, PoisonError},
    time::Duration,
};

use parley_app::{App, AppEvent, Driver, Inbound, KeyInput};
use parley_client::{MessageStyle, Notification, Permission, SessionView};
use parley_core::env::Environment;
use parley_proto::ClientFrame;

use crate::{
    invariants::SessionSnapshot,
    sim_env::{SimEnv, SimInstant},
    sim_relay::{ConnId, SharedRelay, SimRelay},
};

/// What the last render put on screen.
#[derive(Debug, Clone)]
pub struct Screen {
    /// Session state behind the frame.
    pub session: SessionSnapshot,
    /// Roster lines, the local user marked with "(you)".
    pub roster: Vec<String>,
    /// Log lines with their styling.
    pub messages: Vec<(MessageStyle, String)>,
    /// Composer contents.
    pub composer: String,
    /// Status bar text.
    pub status: Option<String>,
    /// Visible alert.
    pub alert: Option<Notification>,
    /// Permission prompt showing.
    pub prompt: bool,
}

impl Screen {
    fn capture(id: usize, app: &App, view: &SessionView<'_>) -> Self {
        let roster = view
            .users
            .iter()
            .map(|user| {
                if view.is_me(user) {
                    format!("{} (you)", user.username)
                } else {
                    user.username.clone()
                }
            })
            .collect();
        let messages = view
            .messages
            .iter()
            .map(|message| {
                let line = match message.sender() {
                    Some(sender) => format!("{sender}: {}", message.body),
                    None => message.body.clone(),
                };
                (view.style(message), line)
            })
            .collect();

        Self {
            session: SessionSnapshot::from_view(id, view),
            roster,
            messages,
            composer: app.composer().text().to_owned(),
            status: app.status_message().map(str::to_owned),
            alert: app.alert().map(|alert| alert.notification.clone()),
            prompt: app.is_prompting(),
        }
    }
}

/// Simulation driver for one client.
pub struct SimDriver {
    id: usize,
    env: SimEnv,
    relay: SharedRelay,
    input: VecDeque<AppEvent>,
    transport: Option<(u64, ConnId)>,
    pending: VecDeque<Inbound>,
    refuse_connections: bool,
    permission: Permission,
    prompts: usize,
    notifications: Vec<Notification>,
    sent: Vec<ClientFrame>,
    screen: Option<Screen>,
    renders: usize,
}

impl SimDriver {
    /// Driver for client `id` on `relay`. Permission starts undecided.
    pub fn new(id: usize, env: SimEnv, relay: SharedRelay) -> Self {
        Self {
            id,
            env,
            relay,
            input: VecDeque::new(),
            transport: None,
            pending: VecDeque::new(),
            refuse_connections: false,
            permission: Permission::Default,
            prompts: 0,
            notifications: Vec::new(),
            sent: Vec::new(),
            screen: None,
            renders: 0,
        }
    }

    /// Permission the platform reports at startup.
    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permission = permission;
        self
    }

    /// Make every later `open` fail.
    pub fn set_refuse_connections(&mut self, refuse: bool) {
        self.refuse_connections = refuse;
    }

    /// Queue an input event.
    pub fn push_input(&mut self, event: AppEvent) {
        self.input.push_back(event);
    }

    /// Queue a key press.
    pub fn push_key(&mut self, key: KeyInput) {
        self.push_input(AppEvent::Key(key));
    }

    /// Queue one key press per character.
    pub fn push_text(&mut self, text: &str) {
        for c in text.chars() {
            self.push_key(KeyInput::Char(c));
        }
    }

    /// Whether scripted input is waiting.
    pub fn has_input(&self) -> bool {
        !self.input.is_empty()
    }

    /// Whether [`Driver::recv`] would return something.
    pub fn inbound_ready(&self) -> bool {
        if !self.pending.is_empty() {
            return true;
        }
        let Some((_, conn)) = self.transport else { return false };
        let relay = lock(&self.relay);
        relay.has_pending(conn) || !relay.is_open(conn)
    }

    /// Relay connection of the current transport.
    pub fn conn(&self) -> Option<ConnId> {
        self.transport.map(|(_, conn)| conn)
    }

    /// Every frame written, in order.
    pub fn sent(&self) -> &[ClientFrame] {
        &self.sent
    }

    /// Alerts shown, in order.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Number of times the permission prompt appeared on screen.
    pub fn prompts(&self) -> usize {
        self.prompts
    }

    /// Last rendered frame.
    pub fn screen(&self) -> Option<&Screen> {
        self.screen.as_ref()
    }

    /// Number of renders.
    pub fn renders(&self) -> usize {
        self.renders
    }

    fn drop_transport(&mut self) {
        if let Some((_, conn)) = self.transport.take() {
            lock(&self.relay).disconnect(conn);
        }
    }
}

impl Driver for SimDriver {
    type Error = Infallible;
    type Instant = SimInstant;

    async fn poll_input(&mut self, _timeout: Duration) -> Result<Option<AppEvent>, Infallible> {
        Ok(self.input.pop_front())
    }

    async fn open(&mut self, generation: u64) -> Result<(), Infallible> {
        self.drop_transport();

        if self.refuse_connections {
            tracing::trace!(client = self.id, generation, "connection refused");
            self.pending
                .push_back(Inbound::Closed { generation, reason: "connection refused".into() });
            return Ok(());
        }

        let conn = lock(&self.relay).connect();
        tracing::trace!(client = self.id, generation, conn, "transport opened");
        self.transport = Some((generation, conn));
        Ok(())
    }

    async fn send(&mut self, frame: ClientFrame) -> Result<(), Infallible> {
        self.sent.push(frame.clone());
        if let Some((_, conn)) = self.transport {
            lock(&self.relay).receive(conn, frame);
        }
        Ok(())
    }

    fn recv(&mut self) -> Option<Inbound> {
        if let Some(inbound) = self.pending.pop_front() {
            return Some(inbound);
        }

        let (generation, conn) = self.transport?;
        let mut relay = lock(&self.relay);
        if let Some(frame) = relay.pop(conn) {
            return Some(Inbound::Frame { generation, frame });
        }
        if relay.is_open(conn) {
            return None;
        }

        relay.disconnect(conn);
        drop(relay);
        self.transport = None;
        Some(Inbound::Closed { generation, reason: "connection dropped by relay".into() })
    }

    fn close(&mut self, generation: u64) {
        if self.transport.is_some_and(|(current, _)| current == generation) {
            self.drop_transport();
        }
    }

    fn now(&self) -> SimInstant {
        self.env.now()
    }

    fn render(&mut self, app: &App, session: &SessionView<'_>) -> Result<(), Infallible> {
        let was_prompting = self.screen.as_ref().is_some_and(|screen| screen.prompt);
        if app.is_prompting() && !was_prompting {
            self.prompts += 1;
        }
        self.screen = Some(Screen::capture(self.id, app, session));
        self.renders += 1;
        Ok(())
    }

    fn permission(&self) -> Permission {
        self.permission
    }

    fn notify(&mut self, notification: &Notification) {
        self.notifications.push(notification.clone());
    }

    fn stop(&mut self) {
        self.drop_transport();
    }
}

/// Lock the relay. A panic elsewhere in a test must not hide the relay state.
pub(crate) fn lock(relay: &SharedRelay) -> MutexGuard<'_, SimRelay> {
    relay.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use parley_proto::ServerFrame;

    use super::*;

    fn driver() -> (SimDriver, SharedRelay) {
        let env = SimEnv::new();
        let relay = SimRelay::new(env.clone(), 1).shared();
        (SimDriver::new(0, env, relay.clone()), relay)
    }

    #[test]
    fn frames_tagged_with_generation() {
        let (mut driver, _relay) = driver();
        block_on(driver.open(3)).unwrap();
        block_on(driver.send(ClientFrame::join("alice"))).unwrap();

        assert!(matches!(
            driver.recv(),
            Some(Inbound::Frame { generation: 3, frame: ServerFrame::Welcome(_) })
        ));
    }

    #[test]
    fn refused_open_reports_close() {
        let (mut driver, _relay) = driver();
        driver.set_refuse_connections(true);
        block_on(driver.open(1)).unwrap();

        assert_eq!(
            driver.recv(),
            Some(Inbound::Closed { generation: 1, reason: "connection refused".into() })
        );
        assert_eq!(driver.conn(), None);
    }

    #[test]
    fn kick_reported_after_queued_frames() {
        let (mut driver, relay) = driver();
        block_on(driver.open(1)).unwrap();
        block_on(driver.send(ClientFrame::join("alice"))).unwrap();
        let conn = driver.conn().unwrap();
        lock(&relay).kick(conn);

        let drained: Vec<_> = std::iter::from_fn(|| driver.recv()).collect();

        assert_eq!(drained.len(), 4);
        assert!(matches!(drained[3], Inbound::Closed { generation: 1, .. }));
        assert!(!driver.inbound_ready());
    }

    #[test]
    fn stale_close_ignored() {
        let (mut driver, _relay) = driver();
        block_on(driver.open(2)).unwrap();
        driver.close(1);
        assert!(driver.conn().is_some());
        driver.close(2);
        assert!(driver.conn().is_none());
    }

    #[test]
    fn input_is_fifo_and_never_waits() {
        let (mut driver, _relay) = driver();
        driver.push_text("ab");

        let first = block_on(driver.poll_input(Duration::from_secs(1))).unwrap();
        let second = block_on(driver.poll_input(Duration::from_secs(1))).unwrap();
        let third = block_on(driver.poll_input(Duration::from_secs(1))).unwrap();

        assert!(matches!(first, Some(AppEvent::Key(KeyInput::Char('a')))));
        assert!(matches!(second, Some(AppEvent::Key(KeyInput::Char('b')))));
        assert!(third.is_none());
        assert_eq!(driver.now(), SimInstant::from_millis(0));
    }
}
