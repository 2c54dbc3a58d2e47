//! Typing indicators.
//!
//! Outbound: [`TypingDebouncer`] turns a burst of local keystrokes into one
//! `typing=true` followed by exactly one `typing=false`.
//!
//! Inbound: [`TypingSet`] holds the other users the relay reports as typing.
//!
//! # Invariants
//!
//! - At most one pending deadline per debouncer. A keystroke cancels the
//!   previous deadline before scheduling the next.
//! - Every emitted [`TypingSignal::Started`] is followed by exactly one
//!   [`TypingSignal::Stopped`] unless [`TypingDebouncer::cancel`] runs first.
//! - The local username never appears in a [`TypingSet`].

use std::time::Duration;

use crate::env::Moment;

/// Quiet period after the last keystroke before `typing=false` is sent.
pub const DEFAULT_TYPING_IDLE: Duration = Duration::from_millis(800);

/// Typing state change to transmit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingSignal {
    /// Local user started typing.
    Started,
    /// Local user stopped typing.
    Stopped,
}

impl TypingSignal {
    /// Wire value of the signal.
    pub fn is_typing(self) -> bool {
        matches!(self, Self::Started)
    }
}

/// Converts keystrokes into bounded-rate typing signals.
#[derive(Debug, Clone)]
pub struct TypingDebouncer<I> {
    idle: Duration,
    typing: bool,
    deadline: Option<I>,
}

impl<I: Moment> TypingDebouncer<I> {
    /// Create an idle debouncer with the given quiet period.
    pub fn new(idle: Duration) -> Self {
        Self { idle, typing: false, deadline: None }
    }

    /// Whether `Started` was emitted without a matching `Stopped` yet.
    pub fn is_typing(&self) -> bool {
        self.typing
    }

    /// The single pending deadline, if any.
    pub fn deadline(&self) -> Option<I> {
        self.deadline
    }

    /// Record a keystroke.
    ///
    /// Returns `Started` on the first keystroke of a burst. The deadline is
    /// re-armed to `now + idle` on every call.
    pub fn on_keystroke(&mut self, now: I) -> Option<TypingSignal> {
        self.deadline = Some(now + self.idle);

        if self.typing {
            return None;
        }
        self.typing = true;
        Some(TypingSignal::Started)
    }

    /// Fire the deadline if it has passed.
    pub fn poll(&mut self, now: I) -> Option<TypingSignal> {
        match self.deadline {
            Some(deadline) if now >= deadline => self.stop(),
            _ => None,
        }
    }

    /// The composed message was sent. Stops immediately.
    pub fn on_send(&mut self) -> Option<TypingSignal> {
        self.stop()
    }

    /// The composer was emptied. Stops immediately.
    pub fn on_clear(&mut self) -> Option<TypingSignal> {
        self.stop()
    }

    /// Drop all pending state without emitting.
    ///
    /// Used on disconnect, when no transport remains to carry the signal.
    pub fn cancel(&mut self) {
        self.typing = false;
        self.deadline = None;
    }

    fn stop(&mut self) -> Option<TypingSignal> {
        self.deadline = None;
        if !self.typing {
            return None;
        }
        self.typing = false;
        Some(TypingSignal::Stopped)
    }
}

/// Users the relay reports as currently typing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypingSet {
    usernames: Vec<String>,
}

impl TypingSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set with the latest relay push.
    ///
    /// Arrival order is kept. Duplicates and `local` are dropped.
    pub fn replace<S>(&mut self, usernames: impl IntoIterator<Item = S>, local: Option<&str>)
    where
        S: Into<String>,
    {
        self.usernames.clear();
        for name in usernames {
            let name = name.into();
            if Some(name.as_str()) == local || self.usernames.contains(&name) {
                continue;
            }
            self.usernames.push(name);
        }
    }

    /// Usernames in arrival order.
    pub fn usernames(&self) -> &[String] {
        &self.usernames
    }

    /// Whether `username` is typing.
    pub fn contains(&self, username: &str) -> bool {
        self.usernames.iter().any(|name| name == username)
    }

    /// Whether nobody is typing.
    pub fn is_empty(&self) -> bool {
        self.usernames.is_empty()
    }

    /// Forget everyone.
    pub fn clear(&mut self) {
        self.usernames.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[allow(clippy::disallowed_methods)]
    fn t0() -> Instant {
        Instant::now()
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn burst_emits_one_start_and_one_stop() {
        let t0 = t0();
        let mut debouncer = TypingDebouncer::new(DEFAULT_TYPING_IDLE);

        assert_eq!(debouncer.on_keystroke(t0), Some(TypingSignal::Started));
        assert_eq!(debouncer.on_keystroke(t0 + ms(300)), None);
        assert_eq!(debouncer.on_keystroke(t0 + ms(600)), None);

        // Deadline follows the last keystroke.
        assert_eq!(debouncer.deadline(), Some(t0 + ms(1400)));
        assert_eq!(debouncer.poll(t0 + ms(1399)), None);
        assert_eq!(debouncer.poll(t0 + ms(1400)), Some(TypingSignal::Stopped));
        assert_eq!(debouncer.poll(t0 + ms(5000)), None);
        assert_eq!(debouncer.deadline(), None);
    }

    #[test]
    fn send_stops_immediately() {
        let t0 = t0();
        let mut debouncer = TypingDebouncer::new(DEFAULT_TYPING_IDLE);
        debouncer.on_keystroke(t0);

        assert_eq!(debouncer.on_send(), Some(TypingSignal::Stopped));
        assert_eq!(debouncer.deadline(), None);
        assert_eq!(debouncer.poll(t0 + ms(900)), None);
    }

    #[test]
    fn clear_when_idle_is_silent() {
        let mut debouncer: TypingDebouncer<Instant> = TypingDebouncer::new(DEFAULT_TYPING_IDLE);
        assert_eq!(debouncer.on_clear(), None);
        assert_eq!(debouncer.on_send(), None);
    }

    #[test]
    fn cancel_drops_without_emitting() {
        let t0 = t0();
        let mut debouncer = TypingDebouncer::new(DEFAULT_TYPING_IDLE);
        debouncer.on_keystroke(t0);

        debouncer.cancel();
        assert!(!debouncer.is_typing());
        assert_eq!(debouncer.deadline(), None);
        assert_eq!(debouncer.poll(t0 + ms(900)), None);

        // Next burst starts fresh.
        assert_eq!(debouncer.on_keystroke(t0 + ms(1000)), Some(TypingSignal::Started));
    }

    #[test]
    fn new_burst_after_stop() {
        let t0 = t0();
        let mut debouncer = TypingDebouncer::new(ms(100));
        debouncer.on_keystroke(t0);
        assert_eq!(debouncer.poll(t0 + ms(100)), Some(TypingSignal::Stopped));
        assert_eq!(debouncer.on_keystroke(t0 + ms(150)), Some(TypingSignal::Started));
    }

    #[test]
    fn typing_set_filters_local_and_duplicates() {
        let mut set = TypingSet::new();
        set.replace(["bob", "alice", "carol", "bob"], Some("alice"));

        assert_eq!(set.usernames(), ["bob", "carol"]);
        assert!(set.contains("carol"));
        assert!(!set.contains("alice"));
    }

    #[test]
    fn typing_set_replaced_wholesale() {
        let mut set = TypingSet::new();
        set.replace(["bob"], None);
        set.replace(Vec::<String>::new(), None);
        assert!(set.is_empty());
    }
}
