//! Deterministic simulation harness for Parley testing.
//!
//! Virtual-time implementations of the `Environment` and `Driver` traits plus
//! an in-process relay double, so the production [`parley_app::Runtime`] can
//! be driven step by step with reproducible timing and network behaviour.
//!
//! # Components
//!
//! - [`SimEnv`]: Virtual clock that only moves when the simulation says so
//! - [`SimRelay`]: Single-room relay double with seeded duplicate delivery
//! - [`SimDriver`]: Scripted input, relay-backed transport, screen capture
//! - [`SimCluster`]: Several clients sharing one relay and one clock
//!
//! # Invariant Testing
//!
//! The `invariants` module checks behavioural properties against every
//! rendered screen. Use [`InvariantRegistry::standard()`] for the common
//! session invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cluster;
pub mod invariants;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_relay;

pub use cluster::{SimClient, SimCluster};
pub use invariants::{
    Invariant, InvariantKind, InvariantRegistry, InvariantResult, SessionSnapshot,
    SystemSnapshot, Violation,
};
pub use sim_driver::{Screen, SimDriver};
pub use sim_env::{SimEnv, SimInstant};
pub use sim_relay::{ConnId, SharedRelay, SimRelay};
