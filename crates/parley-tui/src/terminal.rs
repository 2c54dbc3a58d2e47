//! Terminal driver for the TUI.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and ratatui for rendering. Network uses the WebSocket
//! transport from `parley-client`.

use std::{
    collections::VecDeque,
    io::{self, Stdout, Write, stdout},
    time::{Duration, Instant},
};

use clap::ValueEnum;
use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use parley_app::{App, AppEvent, Driver, Inbound, KeyInput};
use parley_client::{
    Notification, Permission, SessionView,
    transport::{self, ConnectedClient, TransportError, TransportEvent},
};
use parley_proto::ClientFrame;
use ratatui::{Terminal, backend::CrosstermBackend};
use thiserror::Error;
use tokio::sync::mpsc::error::TryRecvError;

use crate::ui;

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// How message alerts are permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum NotificationMode {
    /// Ask once at startup.
    #[default]
    Ask,
    /// Alert without asking.
    Always,
    /// Never alert.
    Never,
}

impl NotificationMode {
    /// Permission the platform reports at startup.
    pub fn permission(self) -> Permission {
        match self {
            Self::Ask => Permission::Default,
            Self::Always => Permission::Granted,
            Self::Never => Permission::Denied,
        }
    }
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Handles terminal I/O (crossterm), rendering (ratatui), and one WebSocket
/// connection at a time tagged with the generation it was opened for.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    server_url: String,
    transport: Option<(u64, ConnectedClient)>,
    pending: VecDeque<Inbound>,
    queued_input: VecDeque<AppEvent>,
    permission: Permission,
}

impl TerminalDriver {
    /// Enter raw mode and the alternate screen.
    pub fn new(server_url: String, notifications: NotificationMode) -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            event_stream: EventStream::new(),
            server_url,
            transport: None,
            pending: VecDeque::new(),
            queued_input: VecDeque::new(),
            permission: notifications.permission(),
        })
    }

    /// Feed an input event ahead of the terminal (e.g. an automatic join).
    pub fn queue_input(&mut self, event: AppEvent) {
        self.queued_input.push_back(event);
    }

    /// Convert a crossterm key event to `KeyInput`.
    fn convert_key(key: KeyEvent) -> Option<KeyInput> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c' | 'd') => Some(KeyInput::Interrupt),
                _ => None,
            };
        }

        match key.code {
            KeyCode::Char(c) => Some(KeyInput::Char(c)),
            KeyCode::Enter => Some(KeyInput::Enter),
            KeyCode::Backspace => Some(KeyInput::Backspace),
            KeyCode::Delete => Some(KeyInput::Delete),
            KeyCode::Esc => Some(KeyInput::Esc),
            KeyCode::Left => Some(KeyInput::Left),
            KeyCode::Right => Some(KeyInput::Right),
            KeyCode::Home => Some(KeyInput::Home),
            KeyCode::End => Some(KeyInput::End),
            _ => None,
        }
    }

    /// Tag a transport event. A close ends the transport.
    fn inbound(&mut self, generation: u64, event: Option<TransportEvent>) -> Inbound {
        match event {
            Some(TransportEvent::Frame(frame)) => Inbound::Frame { generation, frame },
            Some(TransportEvent::Closed { reason }) => {
                self.transport = None;
                Inbound::Closed { generation, reason }
            },
            None => {
                self.transport = None;
                Inbound::Closed { generation, reason: "transport task ended".into() }
            },
        }
    }

    fn drop_transport(&mut self) {
        if let Some((generation, client)) = self.transport.take() {
            tracing::debug!(generation, "closing transport");
            client.stop();
        }
    }
}

/// Next event of the current transport, or never when there is none.
async fn next_transport_event(
    transport: &mut Option<(u64, ConnectedClient)>,
) -> (u64, Option<TransportEvent>) {
    match transport {
        Some((generation, client)) => (*generation, client.from_server.recv().await),
        None => std::future::pending().await,
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;
    type Instant = Instant;

    async fn poll_input(&mut self, timeout: Duration) -> Result<Option<AppEvent>, TerminalError> {
        if let Some(event) = self.queued_input.pop_front() {
            return Ok(Some(event));
        }
        if !self.pending.is_empty() {
            return Ok(None);
        }

        tokio::select! {
            biased;

            // Terminal events
            maybe_event = self.event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        Ok(Self::convert_key(key).map(AppEvent::Key))
                    },
                    Some(Ok(Event::Resize(cols, rows))) => Ok(Some(AppEvent::Resize(cols, rows))),
                    Some(Err(e)) => Err(TerminalError::Io(e)),
                    // Input closed: nothing more can be typed.
                    None => Ok(Some(AppEvent::Key(KeyInput::Interrupt))),
                    _ => Ok(None),
                }
            }

            // Relay traffic wakes the loop early
            (generation, event) = next_transport_event(&mut self.transport) => {
                let inbound = self.inbound(generation, event);
                self.pending.push_back(inbound);
                Ok(None)
            }

            () = tokio::time::sleep(timeout) => Ok(None),
        }
    }

    async fn open(&mut self, generation: u64) -> Result<(), TerminalError> {
        self.drop_transport();

        // The handshake runs in the background; the session's deadline bounds it.
        tracing::debug!(generation, url = %self.server_url, "transport opening");
        self.transport = Some((generation, transport::connect(self.server_url.as_str())));
        Ok(())
    }

    async fn send(&mut self, frame: ClientFrame) -> Result<(), TerminalError> {
        let Some((generation, client)) = &self.transport else {
            return Ok(());
        };
        match client.send(frame) {
            Ok(()) => {},
            Err(TransportError::Full) => {
                tracing::warn!(generation, "outbound queue full, frame dropped");
            },
            // The close itself arrives on the inbound channel.
            Err(e) => tracing::debug!(generation, error = %e, "send on closed transport"),
        }
        Ok(())
    }

    fn recv(&mut self) -> Option<Inbound> {
        if let Some(inbound) = self.pending.pop_front() {
            return Some(inbound);
        }

        let (generation, client) = self.transport.as_mut()?;
        let generation = *generation;
        match client.from_server.try_recv() {
            Ok(event) => Some(self.inbound(generation, Some(event))),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(self.inbound(generation, None)),
        }
    }

    fn close(&mut self, generation: u64) {
        if self.transport.as_ref().is_some_and(|(current, _)| *current == generation) {
            self.drop_transport();
        }
    }

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn render(&mut self, app: &App, session: &SessionView<'_>) -> Result<(), TerminalError> {
        self.terminal.draw(|frame| {
            ui::render(frame, app, session);
        })?;
        Ok(())
    }

    fn permission(&self) -> Permission {
        self.permission
    }

    fn notify(&mut self, notification: &Notification) {
        tracing::debug!(title = %notification.title, "alert");
        // The alert banner is drawn by the UI; the bell gets attention.
        let backend = self.terminal.backend_mut();
        if let Err(e) = backend.write_all(b"\x07").and_then(|()| backend.flush()) {
            tracing::debug!(error = %e, "bell failed");
        }
    }

    fn stop(&mut self) {
        self.drop_transport();
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.stop();
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}
