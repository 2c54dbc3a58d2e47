//! Application state machine.
//!
//! This module defines the [`App`] state machine, which manages the interactive
//! state of the application completely decoupled from I/O and session
//! mechanics.
//!
//! This is a pure state machine: it consumes [`crate::AppEvent`] inputs and
//! produces [`crate::AppAction`] instructions for the runtime to execute.
//!
//! # Responsibilities
//!
//! - Owns the username field and the message composer.
//! - Mirrors the session mode to pick the join or chat screen.
//! - Stores terminal dimensions to handle resize events.
//! - Holds a transient status line and a transient alert banner.
//! - Shows the notification permission prompt and collects its answer from
//!   ordinary key input.

use parley_client::{Notification, Permission, SessionMode};

use crate::{AppAction, AppEvent, Edit, KeyInput, TextField};

/// Ticks an alert banner stays visible.
pub const ALERT_TICKS: u32 = 30;

/// Alert banner for a raised notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// What was raised.
    pub notification: Notification,
    /// Ticks left before the banner hides.
    pub ticks_left: u32,
}

/// Application state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable in simulation.
#[derive(Debug, Clone)]
pub struct App {
    /// Session mode mirrored from the client.
    mode: SessionMode,
    /// Display name being typed on the join screen.
    username: TextField,
    /// Message being composed on the chat screen.
    composer: TextField,
    /// Terminal dimensions (columns, rows).
    terminal_size: (u16, u16),
    /// Transient status message. `None` if no message.
    status_message: Option<String>,
    /// Most recent alert while it is still showing.
    alert: Option<Alert>,
    /// Notification permission prompt awaiting an answer.
    permission_prompt: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Create an App on the join screen.
    pub fn new() -> Self {
        Self {
            mode: SessionMode::NotJoined,
            username: TextField::new(),
            composer: TextField::new(),
            terminal_size: (80, 24),
            status_message: None,
            alert: None,
            permission_prompt: false,
        }
    }

    /// Create an App with the username field pre-filled.
    pub fn with_username(username: &str) -> Self {
        let mut app = Self::new();
        for c in username.chars() {
            app.username.apply(KeyInput::Char(c));
        }
        app
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Tick => self.handle_tick(),
            AppEvent::Resize(cols, rows) => {
                self.terminal_size = (cols, rows);
                vec![AppAction::Render]
            },
            AppEvent::SessionChanged { mode } => {
                self.mode = mode;
                match mode {
                    SessionMode::Joining => {
                        let status = format!("Joining as {}...", self.username_text());
                        self.status_message = Some(status);
                    },
                    SessionMode::Joined => {
                        self.status_message = None;
                    },
                    SessionMode::NotJoined => {
                        self.composer.clear();
                        self.alert = None;
                        self.status_message = None;
                    },
                }
                vec![AppAction::Render]
            },
            AppEvent::SessionUpdated => vec![AppAction::Render],
            AppEvent::Disconnected { reason } => {
                self.status_message = Some(format!("Disconnected: {reason}"));
                vec![AppAction::Render]
            },
            AppEvent::PermissionRequested => {
                self.permission_prompt = true;
                vec![AppAction::Render]
            },
            AppEvent::Notified(notification) => {
                self.alert = Some(Alert { notification, ticks_left: ALERT_TICKS });
                vec![AppAction::Render]
            },
            AppEvent::Error { message } => {
                self.status_message = Some(format!("Error: {message}"));
                vec![AppAction::Render]
            },
        }
    }

    fn handle_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        if key == KeyInput::Interrupt {
            return vec![AppAction::Quit];
        }
        if self.permission_prompt {
            return self.handle_prompt_key(key);
        }

        match self.mode {
            SessionMode::NotJoined => self.handle_join_key(key),
            SessionMode::Joining => match key {
                KeyInput::Esc => vec![AppAction::Leave, AppAction::Render],
                _ => vec![],
            },
            SessionMode::Joined => self.handle_chat_key(key),
        }
    }

    fn handle_prompt_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        let permission = match key {
            KeyInput::Char('y' | 'Y') => Permission::Granted,
            KeyInput::Char('n' | 'N') | KeyInput::Esc => Permission::Denied,
            _ => return vec![],
        };
        self.permission_prompt = false;
        vec![AppAction::ResolvePermission { permission }, AppAction::Render]
    }

    fn handle_join_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        match key {
            KeyInput::Esc => vec![AppAction::Quit],
            KeyInput::Enter => {
                let username = self.username_text().to_owned();
                if username.is_empty() {
                    return vec![];
                }
                self.status_message = None;
                vec![AppAction::Join { username }, AppAction::Render]
            },
            _ => match self.username.apply(key) {
                Edit::Unchanged => vec![],
                Edit::Moved | Edit::Changed => vec![AppAction::Render],
            },
        }
    }

    fn handle_chat_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        match key {
            KeyInput::Esc => vec![AppAction::Leave, AppAction::Render],
            KeyInput::Enter => {
                let message = self.composer.text().trim().to_owned();
                if message.is_empty() {
                    return vec![];
                }
                self.composer.clear();
                vec![AppAction::SendMessage { message }, AppAction::Render]
            },
            _ => match self.composer.apply(key) {
                Edit::Unchanged => vec![],
                Edit::Moved => vec![AppAction::Render],
                Edit::Changed if self.composer.is_empty() => {
                    vec![AppAction::ComposerCleared, AppAction::Render]
                },
                Edit::Changed => vec![AppAction::Keystroke, AppAction::Render],
            },
        }
    }

    fn handle_tick(&mut self) -> Vec<AppAction> {
        let Some(alert) = &mut self.alert else {
            return vec![];
        };

        alert.ticks_left = alert.ticks_left.saturating_sub(1);
        if alert.ticks_left > 0 {
            return vec![];
        }
        self.alert = None;
        vec![AppAction::Render]
    }

    fn username_text(&self) -> &str {
        self.username.text().trim()
    }

    /// Set a status message to display to the user.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Session mode as last reported.
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Username field.
    pub fn username(&self) -> &TextField {
        &self.username
    }

    /// Composer field.
    pub fn composer(&self) -> &TextField {
        &self.composer
    }

    /// Terminal dimensions (columns, rows).
    pub fn terminal_size(&self) -> (u16, u16) {
        self.terminal_size
    }

    /// Transient status message. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Visible alert banner.
    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    /// Whether the permission prompt is showing.
    pub fn is_prompting(&self) -> bool {
        self.permission_prompt
    }
}
