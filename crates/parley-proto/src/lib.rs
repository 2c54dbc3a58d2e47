//! Parley wire protocol
//!
//! Typed frames for the fixed event contract spoken with the relay. Every
//! frame travels as one JSON text message shaped as
//! `{"event": <name>, "data": <payload>}`.
//!
//! # Components
//!
//! - [`ClientFrame`]: Events the client sends (`join`, `message`, `typing`)
//! - [`ServerFrame`]: Events the relay pushes (`welcome`, `roster`,
//!   `message`, `system-message`, `typing`)
//! - [`payloads`]: Payload structs carried by the frames

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
mod frame;
pub mod payloads;

pub use errors::{ProtocolError, Result};
pub use frame::{ClientFrame, ServerFrame};
pub use payloads::User;
