//! Roster tracking.
//!
//! Read-only projection of the latest roster the relay pushed. Every push
//! replaces the whole set; there is no incremental diffing. This re-renders
//! the full roster on every join or leave, which is a known inefficiency for
//! large rooms.

use parley_proto::User;

/// Users the relay reports as connected, in push order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    users: Vec<User>,
}

impl Roster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the roster with a fresh push.
    ///
    /// Ids are unique: a repeated id keeps its first occurrence.
    pub fn replace(&mut self, users: impl IntoIterator<Item = User>) {
        self.users.clear();
        for user in users {
            if self.users.iter().any(|existing| existing.id == user.id) {
                tracing::trace!(id = %user.id, "duplicate roster entry dropped");
                continue;
            }
            self.users.push(user);
        }
    }

    /// Current users.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Number of users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether nobody is online. Valid, not an error.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Forget everyone.
    pub fn clear(&mut self) {
        self.users.clear();
    }

    /// Whether `user` is this session's own connection.
    pub fn is_local(user: &User, connection_id: Option<&str>) -> bool {
        connection_id == Some(user.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_replaces_everything() {
        let mut roster = Roster::new();
        roster.replace([User::new("1", "alice"), User::new("2", "bob")]);
        roster.replace([User::new("3", "carol")]);

        assert_eq!(roster.users(), [User::new("3", "carol")]);
    }

    #[test]
    fn first_occurrence_wins() {
        let mut roster = Roster::new();
        roster.replace([User::new("1", "alice"), User::new("2", "bob"), User::new("1", "mallory")]);

        assert_eq!(roster.len(), 2);
        assert_eq!(roster.users()[0].username, "alice");
    }

    #[test]
    fn empty_push_is_valid() {
        let mut roster = Roster::new();
        roster.replace([User::new("1", "alice")]);
        roster.replace([]);
        assert!(roster.is_empty());
    }

    #[test]
    fn local_marker_uses_connection_id() {
        // Two users may share a display name; only the id identifies us.
        let me = User::new("c1", "alice");
        let twin = User::new("c2", "alice");

        assert!(Roster::is_local(&me, Some("c1")));
        assert!(!Roster::is_local(&twin, Some("c1")));
        assert!(!Roster::is_local(&me, None));
    }
}
