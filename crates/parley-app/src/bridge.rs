//! Session-to-Application translation layer.
//!
//! The [`Bridge`] wraps the [`parley_client::Client`] and adapts it to the
//! application lifecycle.
//!
//! # Responsibilities
//!
//! - Converts [`crate::AppAction`] into client events.
//! - Accumulates [`Effect`]s (transport and notification work) to be executed
//!   by the driver in the next I/O cycle.
//! - Interprets client actions and converts them back into
//!   [`crate::AppEvent`]s to update the UI.
//! - Manages time ticks generically to support both real-time execution and
//!   deterministic simulation.

use parley_client::{
    Client, ClientAction, ClientConfig, ClientError, ClientEvent, Environment, Notification,
    Permission,
};
use parley_proto::ClientFrame;

use crate::{AppAction, AppEvent, Inbound};

/// I/O the driver must perform on the session's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open a transport tagged with `generation`.
    Open {
        /// Generation for inbound traffic.
        generation: u64,
    },
    /// Write a frame on the current transport.
    Send(ClientFrame),
    /// Tear down the transport of `generation`.
    Close {
        /// Generation being closed.
        generation: u64,
    },
    /// Show a local alert.
    Notify(Notification),
}

/// Bridge between App and Client session logic.
///
/// Generic over Environment to support both production and simulation.
/// The Instant type is determined by the Environment's associated type.
pub struct Bridge<E: Environment> {
    client: Client<E>,
    effects: Vec<Effect>,
}

impl<E: Environment> Bridge<E> {
    /// Create a new Bridge with the given environment and configuration.
    pub fn new(env: E, config: ClientConfig) -> Self {
        Self { client: Client::new(env, config), effects: Vec::new() }
    }

    /// The wrapped client.
    pub fn client(&self) -> &Client<E> {
        &self.client
    }

    /// Report the process start with the platform's current permission.
    pub fn start(&mut self, permission: Permission) -> Vec<AppEvent> {
        let result = self.client.handle(ClientEvent::Started { permission });
        self.handle_client_result(result)
    }

    /// Process an App action and return resulting App events.
    pub fn process_app_action(&mut self, action: AppAction) -> Vec<AppEvent> {
        let event = match action {
            AppAction::Join { username } => ClientEvent::Join { username },
            AppAction::Leave => ClientEvent::Leave,
            AppAction::Keystroke => ClientEvent::Keystroke,
            AppAction::SendMessage { message } => ClientEvent::SendMessage { message },
            AppAction::ComposerCleared => ClientEvent::ComposerCleared,
            AppAction::ResolvePermission { permission } => {
                ClientEvent::PermissionResolved { permission }
            },
            AppAction::Render | AppAction::Quit => return vec![],
        };
        let result = self.client.handle(event);
        self.handle_client_result(result)
    }

    /// Handle traffic from the transport.
    pub fn handle_inbound(&mut self, inbound: Inbound) -> Vec<AppEvent> {
        let event = match inbound {
            Inbound::Frame { generation, frame } => {
                ClientEvent::FrameReceived { generation, frame }
            },
            Inbound::Closed { generation, reason } => {
                ClientEvent::TransportClosed { generation, reason }
            },
        };
        let result = self.client.handle(event);
        let mut events = self.handle_client_result(result);
        events.push(AppEvent::SessionUpdated);
        events
    }

    /// Process a time tick.
    pub fn handle_tick(&mut self, now: E::Instant) -> Vec<AppEvent> {
        let result = self.client.handle(ClientEvent::Tick { now });
        self.handle_client_result(result)
    }

    /// Take pending effects.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    fn handle_client_result(
        &mut self,
        result: Result<Vec<ClientAction>, ClientError>,
    ) -> Vec<AppEvent> {
        match result {
            Ok(actions) => self.process_client_actions(actions),
            Err(e) if e.is_validation() => {
                tracing::debug!(error = %e, "input rejected");
                vec![]
            },
            Err(e) => vec![AppEvent::Error { message: e.to_string() }],
        }
    }

    fn process_client_actions(&mut self, actions: Vec<ClientAction>) -> Vec<AppEvent> {
        let mut events = Vec::new();

        for action in actions {
            match action {
                ClientAction::Open { generation } => self.effects.push(Effect::Open { generation }),
                ClientAction::Send(frame) => self.effects.push(Effect::Send(frame)),
                ClientAction::Close { generation } => {
                    self.effects.push(Effect::Close { generation });
                },
                ClientAction::Notify(notification) => {
                    self.effects.push(Effect::Notify(notification.clone()));
                    events.push(AppEvent::Notified(notification));
                },
                ClientAction::RequestPermission => events.push(AppEvent::PermissionRequested),
                ClientAction::SessionChanged { mode } => {
                    events.push(AppEvent::SessionChanged { mode });
                },
                ClientAction::Disconnected { reason } => {
                    events.push(AppEvent::Disconnected { reason });
                },
            }
        }

        events
    }
}
