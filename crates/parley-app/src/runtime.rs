//! Generic runtime for application orchestration.
//!
//! The Runtime drives the application event loop, coordinating between:
//! - [`App`]: UI state machine
//! - [`Bridge`]: Session bridge to Client
//! - [`Driver`]: Platform-specific I/O
//!
//! One cycle waits for input (bounded by the nearest client deadline),
//! delivers at most one inbound transport event, then ticks. Every effect a
//! step produces is executed before the next step starts, so events are
//! processed strictly one at a time and in transport order.

use std::time::Duration;

use parley_client::{ClientConfig, Environment};

use crate::{App, AppAction, AppEvent, Bridge, Driver, Effect};

/// Longest wait for input between ticks.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Generic runtime that orchestrates App, Bridge, and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `E`: Environment providing time to the client
pub struct Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    driver: D,
    app: App,
    bridge: Bridge<E>,
    started: bool,
}

impl<D, E> Runtime<D, E>
where
    D: Driver<Instant = E::Instant>,
    E: Environment,
{
    /// Create a new runtime with the given driver, environment and App.
    pub fn new(driver: D, env: E, config: ClientConfig, app: App) -> Self {
        let bridge = Bridge::new(env, config);
        Self { driver, app, bridge, started: false }
    }

    /// Run the main event loop until the user quits.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters a local I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        self.start().await?;

        while !self.step().await? {}

        self.driver.stop();
        Ok(())
    }

    /// Report startup to the client and draw the first frame.
    ///
    /// Called by [`Runtime::run`]; idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters a local I/O error.
    pub async fn start(&mut self) -> Result<(), D::Error> {
        if self.started {
            return Ok(());
        }
        self.started = true;

        let permission = self.driver.permission();
        let events = self.bridge.start(permission);
        self.flush_effects().await?;
        self.process_bridge_events(events).await?;
        self.render()
    }

    /// Process one cycle of the event loop.
    ///
    /// Returns `true` if the application should quit.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters a local I/O error.
    pub async fn step(&mut self) -> Result<bool, D::Error> {
        let timeout = self.poll_timeout();
        let input = self.driver.poll_input(timeout).await?;

        let quit = match input {
            Some(event) => {
                let actions = self.app.handle(event);
                self.process_actions(actions).await?
            },
            None => {
                let actions = self.app.handle(AppEvent::Tick);
                self.process_actions(actions).await?
            },
        };
        if quit {
            return Ok(true);
        }

        if let Some(inbound) = self.driver.recv() {
            let events = self.bridge.handle_inbound(inbound);
            self.flush_effects().await?;
            if self.process_bridge_events(events).await? {
                return Ok(true);
            }
        }

        let now = self.driver.now();
        let events = self.bridge.handle_tick(now);
        self.flush_effects().await?;
        self.process_bridge_events(events).await
    }

    /// Wait until the nearest client deadline, capped at [`TICK_INTERVAL`].
    fn poll_timeout(&self) -> Duration {
        let Some(deadline) = self.bridge.client().next_deadline() else {
            return TICK_INTERVAL;
        };
        let now = self.driver.now();
        if deadline <= now {
            return Duration::ZERO;
        }
        (deadline - now).min(TICK_INTERVAL)
    }

    /// Process actions returned by the App.
    ///
    /// Returns `true` if should quit.
    async fn process_actions(&mut self, initial_actions: Vec<AppAction>) -> Result<bool, D::Error> {
        let mut pending_actions = initial_actions;

        while !pending_actions.is_empty() {
            let actions = std::mem::take(&mut pending_actions);

            for action in actions {
                match action {
                    AppAction::Render => self.render()?,
                    AppAction::Quit => return Ok(true),

                    // Session operations go through the bridge
                    AppAction::Join { .. }
                    | AppAction::Leave
                    | AppAction::Keystroke
                    | AppAction::SendMessage { .. }
                    | AppAction::ComposerCleared
                    | AppAction::ResolvePermission { .. } => {
                        let events = self.bridge.process_app_action(action);
                        self.flush_effects().await?;
                        for event in events {
                            pending_actions.extend(self.app.handle(event));
                        }
                    },
                }
            }
        }
        Ok(false)
    }

    /// Process events from Bridge back to App.
    async fn process_bridge_events(&mut self, events: Vec<AppEvent>) -> Result<bool, D::Error> {
        for event in events {
            let actions = self.app.handle(event);
            if self.process_actions(actions).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Execute every pending effect in order.
    async fn flush_effects(&mut self) -> Result<(), D::Error> {
        loop {
            let effects = self.bridge.take_effects();
            if effects.is_empty() {
                return Ok(());
            }

            for effect in effects {
                match effect {
                    Effect::Open { generation } => self.driver.open(generation).await?,
                    Effect::Send(frame) => self.driver.send(frame).await?,
                    Effect::Close { generation } => self.driver.close(generation),
                    Effect::Notify(notification) => self.driver.notify(&notification),
                }
            }
        }
    }

    fn render(&mut self) -> Result<(), D::Error> {
        self.driver.render(&self.app, &self.bridge.client().view())
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Get a mutable reference to the App
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    /// Get a reference to the session bridge
    pub fn bridge(&self) -> &Bridge<E> {
        &self.bridge
    }

    /// Get a reference to the driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get a mutable reference to the driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}
