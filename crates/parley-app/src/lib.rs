//! Application layer for Parley
//!
//! Pure state machines and generic runtime for UI and session orchestration,
//! enabling deterministic simulation testing with the same code that runs in
//! production.
//!
//! # Components
//!
//! - [`App`]: UI state machine (join form, composer, alerts, status line)
//! - [`Bridge`]: Session bridge (translates App actions to Client events)
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`Runtime`]: Generic orchestration loop using Driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod bridge;
mod driver;
mod event;
mod input;
mod runtime;

pub use action::AppAction;
pub use app::{ALERT_TICKS, Alert, App};
pub use bridge::{Bridge, Effect};
pub use driver::{Driver, Inbound};
pub use event::AppEvent;
pub use input::{Edit, KeyInput, TextField};
pub use runtime::{Runtime, TICK_INTERVAL};
