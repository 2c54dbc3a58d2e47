//! Several clients sharing one relay and one virtual clock.
//!
//! Each [`SimClient`] runs the production [`Runtime`] over a [`SimDriver`].
//! The cluster interleaves their steps deterministically and checks the
//! standard invariants after every one of them.

use std::{convert::Infallible, future::Future, time::Duration};

use futures::executor::block_on;
use parley_app::{App, Driver, KeyInput, Runtime, TICK_INTERVAL};
use parley_client::{Client, ClientConfig, Permission};
use parley_core::env::Environment;

use crate::{
    invariants::{InvariantRegistry, SessionSnapshot, SystemSnapshot},
    sim_driver::{self, SimDriver},
    sim_env::SimEnv,
    sim_relay::{SharedRelay, SimRelay},
};

/// Upper bound on steps one [`SimCluster::settle`] may take.
const MAX_SETTLE_STEPS: usize = 10_000;

/// One simulated client: the production runtime over a [`SimDriver`].
pub struct SimClient {
    id: usize,
    runtime: Runtime<SimDriver, SimEnv>,
    quit: bool,
}

impl SimClient {
    /// Start a client on `relay` with the given driver setup.
    pub fn new(id: usize, env: &SimEnv, driver: SimDriver) -> Self {
        let mut runtime = Runtime::new(driver, env.clone(), ClientConfig::default(), App::new());
        run(runtime.start());
        Self { id, runtime, quit: false }
    }

    /// Run one runtime cycle. Returns `true` once the user has quit.
    pub fn step(&mut self) -> bool {
        if self.quit {
            return true;
        }
        if run(self.runtime.step()) {
            self.runtime.driver_mut().stop();
            self.quit = true;
        }
        self.quit
    }

    /// Queue a key press.
    pub fn press(&mut self, key: KeyInput) {
        self.runtime.driver_mut().push_key(key);
    }

    /// Queue one key press per character.
    pub fn type_text(&mut self, text: &str) {
        self.runtime.driver_mut().push_text(text);
    }

    /// Whether the client has input or inbound traffic to process.
    pub fn is_busy(&self) -> bool {
        !self.quit && (self.driver().has_input() || self.driver().inbound_ready())
    }

    /// Whether the user has quit.
    pub fn has_quit(&self) -> bool {
        self.quit
    }

    /// Capture observable state.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::from_client(self.id, self.client())
    }

    /// The session client.
    pub fn client(&self) -> &Client<SimEnv> {
        self.runtime.bridge().client()
    }

    /// The UI state machine.
    pub fn app(&self) -> &App {
        self.runtime.app()
    }

    /// The driver.
    pub fn driver(&self) -> &SimDriver {
        self.runtime.driver()
    }

    /// The driver, mutably.
    pub fn driver_mut(&mut self) -> &mut SimDriver {
        self.runtime.driver_mut()
    }
}

/// Deterministic multi-client simulation.
pub struct SimCluster {
    env: SimEnv,
    relay: SharedRelay,
    clients: Vec<SimClient>,
    invariants: InvariantRegistry,
}

impl SimCluster {
    /// Empty cluster. `seed` drives relay chaos.
    pub fn new(seed: u64) -> Self {
        let env = SimEnv::new();
        let relay = SimRelay::new(env.clone(), seed).shared();
        Self { env, relay, clients: Vec::new(), invariants: InvariantRegistry::standard() }
    }

    /// Add a client whose platform already reports `permission`. Returns its
    /// index.
    pub fn add_client(&mut self, permission: Permission) -> usize {
        self.add_client_with(|driver| driver.with_permission(permission))
    }

    /// Add a client with a custom driver setup. Returns its index.
    pub fn add_client_with(&mut self, setup: impl FnOnce(SimDriver) -> SimDriver) -> usize {
        let id = self.clients.len();
        let driver = setup(SimDriver::new(id, self.env.clone(), self.relay.clone()));
        self.clients.push(SimClient::new(id, &self.env, driver));
        self.check(&format!("after starting client {id}"));
        id
    }

    /// Type `username`, press Enter and settle.
    pub fn join(&mut self, client: usize, username: &str) {
        let sim = &mut self.clients[client];
        sim.type_text(username);
        sim.press(KeyInput::Enter);
        self.settle();
    }

    /// Type `text`, press Enter and settle.
    pub fn say(&mut self, client: usize, text: &str) {
        let sim = &mut self.clients[client];
        sim.type_text(text);
        sim.press(KeyInput::Enter);
        self.settle();
    }

    /// Step busy clients round-robin until no client has work left.
    ///
    /// Virtual time does not move.
    pub fn settle(&mut self) {
        for _ in 0..MAX_SETTLE_STEPS {
            let busy: Vec<usize> =
                (0..self.clients.len()).filter(|&i| self.clients[i].is_busy()).collect();
            if busy.is_empty() {
                return;
            }
            for i in busy {
                self.clients[i].step();
                self.check(&format!("after step of client {i}"));
            }
        }
        tracing::warn!(steps = MAX_SETTLE_STEPS, "simulation did not settle");
    }

    /// Let `duration` of virtual time pass, ticking every client at least
    /// every [`TICK_INTERVAL`] and settling in between.
    pub fn advance(&mut self, duration: Duration) {
        let target = self.env.now() + duration;
        loop {
            let now = self.env.now();
            if now >= target {
                return;
            }
            self.env.advance((target - now).min(TICK_INTERVAL));
            for i in 0..self.clients.len() {
                self.clients[i].step();
                self.check(&format!("after tick of client {i}"));
            }
            self.settle();
        }
    }

    /// Run `f` against the relay.
    pub fn with_relay<R>(&self, f: impl FnOnce(&mut SimRelay) -> R) -> R {
        f(&mut sim_driver::lock(&self.relay))
    }

    /// The shared clock.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Client `index`.
    pub fn client(&self, index: usize) -> &SimClient {
        &self.clients[index]
    }

    /// Client `index`, mutably.
    pub fn client_mut(&mut self, index: usize) -> &mut SimClient {
        &mut self.clients[index]
    }

    /// Capture every client.
    pub fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot::from_clients(self.clients.iter().map(SimClient::snapshot).collect())
    }

    fn check(&self, context: &str) {
        self.invariants.assert_all(&self.snapshot(), context);
    }
}

fn run<T>(future: impl Future<Output = Result<T, Infallible>>) -> T {
    match block_on(future) {
        Ok(value) => value,
        Err(never) => match never {},
    }
}
