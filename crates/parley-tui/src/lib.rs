//! Terminal UI for Parley
//!
//! A thin shell over [`parley_app::Driver`] that provides terminal-specific
//! I/O. All orchestration logic lives in the generic [`parley_app::Runtime`].
//!
//! This crate only handles terminal rendering, the WebSocket hookup and the
//! `.env` bootstrap command.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod setup_env;
pub mod system_env;
pub mod terminal;
pub mod ui;

pub use parley_app::{App, AppAction, AppEvent, Bridge, Driver, KeyInput, Runtime};
pub use setup_env::{EnvOutcome, EnvReport, init_env};
pub use system_env::SystemEnv;
pub use terminal::{NotificationMode, TerminalDriver, TerminalError};
