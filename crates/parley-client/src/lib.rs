//! Client
//!
//! Action-based session state machine for the Parley chat client. Tracks the
//! joined/not-joined mode and wires every input, frame and tick through the
//! core components.
//!
//! # Architecture
//!
//! The client follows the same Sans-IO and Action-Based patterns as
//! [`parley_core`]. It receives events ([`ClientEvent`]), processes them
//! through pure state machine logic, and returns actions ([`ClientAction`]) for
//! the caller to execute.
//!
//! # Components
//!
//! - [`Client`]: Session state machine and composition root
//! - [`ClientEvent`]: Events fed into the client
//! - [`ClientAction`]: Actions produced by the client
//! - [`SessionView`]: Borrowed snapshot for rendering
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::ConnectedClient`]: Channels to a WebSocket connection task
//! - [`transport::connect`]: Connect to a relay

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod config;
mod error;
mod event;
mod view;

#[cfg(feature = "transport")]
pub mod transport;

pub use client::Client;
pub use config::ClientConfig;
pub use error::ClientError;
pub use event::{ClientAction, ClientEvent, SessionMode};
pub use parley_core::{
    connection::ConnectionState,
    env::Environment,
    message_log::{Message, MessageStyle},
    notification::{Notification, Permission},
};
pub use view::SessionView;
