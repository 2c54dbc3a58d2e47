//! Client state machine.
//!
//! The `Client` is the session's composition root. It owns the connection,
//! typing, roster, log and notification components and is the central
//! reducer: every external event becomes one `handle` call whose actions the
//! caller executes before feeding the next event.

use parley_core::{
    connection::{Connection, ConnectionAction, ConnectionState},
    env::Environment,
    message_log::{Message, MessageLog},
    notification::{NotificationTrigger, Permission},
    roster::Roster,
    typing::{TypingDebouncer, TypingSet, TypingSignal},
};
use parley_proto::{ClientFrame, ServerFrame};

use crate::{
    config::ClientConfig,
    error::ClientError,
    event::{ClientAction, ClientEvent, SessionMode},
    view::SessionView,
};

/// Chat session client.
pub struct Client<E: Environment> {
    /// Environment for timing.
    env: E,

    /// Joined vs not joined.
    mode: SessionMode,

    /// Local username while a session exists.
    username: Option<String>,

    /// The single relay connection.
    connection: Connection<E::Instant>,

    /// Outbound typing signals.
    debouncer: TypingDebouncer<E::Instant>,

    /// Latest roster push.
    roster: Roster,

    /// Other users typing.
    typing: TypingSet,

    /// Session history. Survives drops; cleared on the next join.
    log: MessageLog,

    /// Username the log was recorded under. Outlives the session like the log.
    log_owner: Option<String>,

    /// Alert decisions and permission prompt bookkeeping.
    notifications: NotificationTrigger,
}

impl<E: Environment> Client<E> {
    /// Create a client with no session.
    pub fn new(env: E, config: ClientConfig) -> Self {
        Self {
            env,
            mode: SessionMode::NotJoined,
            username: None,
            connection: Connection::new(config.connection),
            debouncer: TypingDebouncer::new(config.typing_idle),
            roster: Roster::new(),
            typing: TypingSet::new(),
            log: MessageLog::new(),
            log_owner: None,
            notifications: NotificationTrigger::new(),
        }
    }

    /// Current session mode.
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Whether the session is joined.
    pub fn is_joined(&self) -> bool {
        self.mode == SessionMode::Joined
    }

    /// Local username. `None` without a session.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Relay-assigned connection id.
    pub fn connection_id(&self) -> Option<&str> {
        self.connection.connection_id()
    }

    /// Generation of the current transport.
    pub fn generation(&self) -> u64 {
        self.connection.generation()
    }

    /// Current roster.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Other users typing.
    pub fn typing(&self) -> &TypingSet {
        &self.typing
    }

    /// Whether the local user is flagged as typing.
    pub fn is_typing(&self) -> bool {
        self.debouncer.is_typing()
    }

    /// Message history.
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Notification permission.
    pub fn permission(&self) -> Permission {
        self.notifications.permission()
    }

    /// Earliest pending deadline (handshake timeout or typing idle).
    ///
    /// The caller must deliver a [`ClientEvent::Tick`] no later than this.
    pub fn next_deadline(&self) -> Option<E::Instant> {
        match (self.connection.deadline(), self.debouncer.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Borrowed snapshot for rendering.
    pub fn view(&self) -> SessionView<'_> {
        SessionView {
            mode: self.mode,
            connection_state: self.connection.state(),
            username: self.username.as_deref(),
            log_owner: self.log_owner.as_deref(),
            connection_id: self.connection.connection_id(),
            users: self.roster.users(),
            typing: self.typing.usernames(),
            messages: self.log.messages(),
        }
    }

    /// Process an event and return resulting actions.
    ///
    /// # Errors
    ///
    /// - `ClientError::EmptyUsername`, `EmptyMessage`, `NotJoined` for
    ///   rejected input. No state changes and no actions in that case.
    /// - `ClientError::Connection` if the connection refuses a transition.
    pub fn handle(
        &mut self,
        event: ClientEvent<E::Instant>,
    ) -> Result<Vec<ClientAction>, ClientError> {
        match event {
            ClientEvent::Started { permission } => Ok(self.handle_started(permission)),
            ClientEvent::PermissionResolved { permission } => {
                self.notifications.set_permission(permission);
                Ok(vec![])
            },
            ClientEvent::Join { username } => self.handle_join(&username),
            ClientEvent::Leave => Ok(self.handle_leave()),
            ClientEvent::Keystroke => self.handle_keystroke(),
            ClientEvent::SendMessage { message } => self.handle_send_message(&message),
            ClientEvent::ComposerCleared => self.handle_composer_cleared(),
            ClientEvent::FrameReceived { generation, frame } => {
                self.handle_frame(generation, frame)
            },
            ClientEvent::TransportClosed { generation, reason } => {
                Ok(self.handle_transport_closed(generation, reason))
            },
            ClientEvent::Tick { now } => self.handle_tick(now),
        }
    }

    fn handle_started(&mut self, permission: Permission) -> Vec<ClientAction> {
        self.notifications.set_permission(permission);
        if self.notifications.request_permission() {
            vec![ClientAction::RequestPermission]
        } else {
            vec![]
        }
    }

    fn handle_join(&mut self, username: &str) -> Result<Vec<ClientAction>, ClientError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ClientError::EmptyUsername);
        }

        if self.mode != SessionMode::NotJoined {
            tracing::debug!(mode = ?self.mode, "join ignored, session already exists");
            return Ok(vec![]);
        }

        tracing::debug!(%username, "joining");

        self.log.clear();
        self.roster.clear();
        self.typing.clear();
        self.username = Some(username.to_owned());
        self.log_owner = Some(username.to_owned());
        self.mode = SessionMode::Joining;

        let now = self.env.now();
        let mut actions = lower(self.connection.connect(username, now));
        actions.push(ClientAction::SessionChanged { mode: self.mode });
        Ok(actions)
    }

    fn handle_leave(&mut self) -> Vec<ClientAction> {
        if self.mode == SessionMode::NotJoined {
            return vec![];
        }

        tracing::debug!(mode = ?self.mode, "leaving");

        self.debouncer.cancel();
        let mut actions = lower(self.connection.disconnect());
        self.end_session();
        actions.push(ClientAction::SessionChanged { mode: self.mode });
        actions
    }

    fn handle_keystroke(&mut self) -> Result<Vec<ClientAction>, ClientError> {
        if !self.is_joined() {
            return Ok(vec![]);
        }

        let now = self.env.now();
        let signal = self.debouncer.on_keystroke(now);
        self.send_typing(signal)
    }

    fn handle_send_message(&mut self, message: &str) -> Result<Vec<ClientAction>, ClientError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ClientError::EmptyMessage);
        }
        if !self.is_joined() {
            return Err(ClientError::NotJoined);
        }

        let mut actions = vec![lower_one(self.connection.send(ClientFrame::message(message))?)];
        let signal = self.debouncer.on_send();
        actions.extend(self.send_typing(signal)?);
        Ok(actions)
    }

    fn handle_composer_cleared(&mut self) -> Result<Vec<ClientAction>, ClientError> {
        if !self.is_joined() {
            return Ok(vec![]);
        }

        let signal = self.debouncer.on_clear();
        self.send_typing(signal)
    }

    fn handle_frame(
        &mut self,
        generation: u64,
        frame: ServerFrame,
    ) -> Result<Vec<ClientAction>, ClientError> {
        if !self.connection.accepts(generation, &frame) {
            tracing::trace!(
                generation,
                current = self.connection.generation(),
                event = frame.event_name(),
                "stale or early frame dropped"
            );
            return Ok(vec![]);
        }

        match frame {
            ServerFrame::Welcome(welcome) => self.handle_welcome(welcome.id),
            ServerFrame::Roster(roster) => {
                self.roster.replace(roster.users);
                Ok(vec![])
            },
            ServerFrame::Message(msg) => Ok(self.append(msg.into())),
            ServerFrame::SystemMessage(msg) => Ok(self.append(msg.into())),
            ServerFrame::Typing(update) => {
                self.typing.replace(update.usernames, self.username.as_deref());
                Ok(vec![])
            },
        }
    }

    fn handle_welcome(&mut self, connection_id: String) -> Result<Vec<ClientAction>, ClientError> {
        self.connection.handle_welcome(connection_id)?;

        if self.mode != SessionMode::Joining {
            return Ok(vec![]);
        }

        self.mode = SessionMode::Joined;
        tracing::debug!(connection_id = ?self.connection.connection_id(), "joined");
        Ok(vec![ClientAction::SessionChanged { mode: self.mode }])
    }

    fn append(&mut self, message: Message) -> Vec<ClientAction> {
        let notification =
            self.notifications.evaluate(&message, self.is_joined(), self.username.as_deref());

        if !self.log.append(message) {
            return vec![];
        }

        notification.map(ClientAction::Notify).into_iter().collect()
    }

    fn handle_transport_closed(&mut self, generation: u64, reason: String) -> Vec<ClientAction> {
        if !self.connection.transport_closed(generation, &reason) {
            tracing::trace!(generation, "close for stale transport ignored");
            return vec![];
        }

        self.forced_disconnect(reason)
    }

    fn handle_tick(&mut self, now: E::Instant) -> Result<Vec<ClientAction>, ClientError> {
        let timed_out = self.connection.tick(now);
        if let Some(ConnectionAction::Close { reason, .. }) = timed_out.last() {
            let reason = reason.clone();
            let mut actions = lower(timed_out);
            actions.extend(self.forced_disconnect(reason));
            return Ok(actions);
        }

        let signal = self.debouncer.poll(now);
        if !self.connection.is_connected() {
            return Ok(vec![]);
        }
        self.send_typing(signal)
    }

    /// Drop the session without a user request. The log survives.
    fn forced_disconnect(&mut self, reason: String) -> Vec<ClientAction> {
        self.debouncer.cancel();
        self.end_session();
        vec![
            ClientAction::SessionChanged { mode: self.mode },
            ClientAction::Disconnected { reason },
        ]
    }

    fn end_session(&mut self) {
        self.roster.clear();
        self.typing.clear();
        self.username = None;
        self.mode = SessionMode::NotJoined;
    }

    fn send_typing(
        &self,
        signal: Option<TypingSignal>,
    ) -> Result<Vec<ClientAction>, ClientError> {
        let Some(signal) = signal else {
            return Ok(vec![]);
        };
        let action = self.connection.send(ClientFrame::typing(signal.is_typing()))?;
        Ok(vec![lower_one(action)])
    }
}

fn lower(actions: Vec<ConnectionAction>) -> Vec<ClientAction> {
    actions.into_iter().map(lower_one).collect()
}

fn lower_one(action: ConnectionAction) -> ClientAction {
    match action {
        ConnectionAction::Open { generation } => ClientAction::Open { generation },
        ConnectionAction::Send(frame) => ClientAction::Send(frame),
        ConnectionAction::Close { generation, .. } => ClientAction::Close { generation },
    }
}
