//! Core session components for Parley.
//!
//! Every component here is a pure state machine: no I/O, no clocks read
//! internally, no async. Time enters as a parameter and side effects leave as
//! returned actions, so the same code runs under the terminal runtime and
//! under deterministic simulation.
//!
//! # Components
//!
//! - [`connection::Connection`]: connection lifecycle and the only outbound
//!   send surface
//! - [`typing::TypingDebouncer`]: keystrokes to bounded-rate typing signals
//! - [`typing::TypingSet`]: who else is typing
//! - [`roster::Roster`]: latest server-pushed roster
//! - [`message_log::MessageLog`]: append-only, de-duplicated message history
//! - [`notification::NotificationTrigger`]: local alerts for new messages
//! - [`env::Environment`]: time abstraction for production and simulation

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod connection;
pub mod env;
pub mod error;
pub mod message_log;
pub mod notification;
pub mod roster;
pub mod typing;

pub use error::ConnectionError;
