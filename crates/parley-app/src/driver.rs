//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::{future::Future, time::Duration};

use parley_client::{Notification, Permission, SessionView};
use parley_core::env::Moment;
use parley_proto::{ClientFrame, ServerFrame};

use crate::{App, AppEvent};

/// Traffic delivered by the transport, tagged with its generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A decoded frame.
    Frame {
        /// Generation of the transport it arrived on.
        generation: u64,
        /// The frame.
        frame: ServerFrame,
    },
    /// The transport dropped or failed to open.
    Closed {
        /// Generation of the transport that dropped.
        generation: u64,
        /// Why.
        reason: String,
    },
}

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in the production TUI and in simulation.
///
/// # Implementations
///
/// - **TUI**: crossterm for terminal events, tokio-tungstenite for WebSocket
/// - **Simulation**: scripted input and an in-process relay double
///
/// # Transport failures
///
/// A transport that fails to open or drops later is not a driver error. The
/// driver reports it as [`Inbound::Closed`] so the session can reset to a safe
/// state. Driver errors are reserved for the local platform (terminal I/O).
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Time instant type. Enables virtual time in simulation.
    type Instant: Moment;

    /// Wait up to `timeout` for the next user input event.
    ///
    /// Returns `None` on timeout. May return early with `None` when inbound
    /// traffic becomes ready.
    fn poll_input(
        &mut self,
        timeout: Duration,
    ) -> impl Future<Output = Result<Option<AppEvent>, Self::Error>> + Send;

    /// Open a transport for `generation`, replacing any previous one.
    fn open(&mut self, generation: u64) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Send a frame on the current transport. Dropped if none is open.
    fn send(&mut self, frame: ClientFrame) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Next ready inbound event, without waiting. FIFO per transport.
    fn recv(&mut self) -> Option<Inbound>;

    /// Close the transport of `generation`, if it is still current.
    fn close(&mut self, generation: u64);

    /// Current time instant.
    fn now(&self) -> Self::Instant;

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, app: &App, session: &SessionView<'_>) -> Result<(), Self::Error>;

    /// Notification permission the platform already knows at startup.
    ///
    /// An undecided permission is asked about through the [`App`] prompt,
    /// never by the driver.
    fn permission(&self) -> Permission;

    /// Show a local alert. Failures are swallowed by the implementation.
    fn notify(&mut self, notification: &Notification);

    /// Stop the connection and clean up resources.
    fn stop(&mut self);
}
