//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use std::collections::HashSet;

use parley_client::{ConnectionState, SessionMode};

use super::{Invariant, InvariantKind, InvariantResult, SystemSnapshot, Violation};

/// The local user never appears in their own typing indicator.
pub struct LocalNeverTyping;

impl Invariant for LocalNeverTyping {
    fn kind(&self) -> InvariantKind {
        InvariantKind::LocalNeverTyping
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let Some(username) = &client.username else { continue };
            if client.typing.contains(username) {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!(
                        "client {}: local user {username} in typing set {:?}",
                        client.id, client.typing
                    ),
                });
            }
        }
        Ok(())
    }
}

/// No two log entries share an id.
pub struct UniqueMessageIds;

impl Invariant for UniqueMessageIds {
    fn kind(&self) -> InvariantKind {
        InvariantKind::UniqueMessageIds
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let mut seen = HashSet::new();
            for id in &client.message_ids {
                if !seen.insert(id) {
                    return Err(Violation {
                        invariant: self.kind(),
                        message: format!("client {}: message id {id} logged twice", client.id),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Without a session there is nothing live to show.
///
/// `NotJoined` implies a closed connection, an empty roster and typing set,
/// no username, and no typing advertised.
pub struct IdleWhenNotJoined;

impl Invariant for IdleWhenNotJoined {
    fn kind(&self) -> InvariantKind {
        InvariantKind::IdleWhenNotJoined
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if client.mode != SessionMode::NotJoined {
                continue;
            }
            let idle = client.connection_state == ConnectionState::Disconnected
                && client.roster.is_empty()
                && client.typing.is_empty()
                && client.username.is_none()
                && !client.local_typing;
            if !idle {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!(
                        "client {}: live state without a session: {client:?}",
                        client.id
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Session mode and connection state move together.
///
/// `Joining` is `Connecting` and `Joined` is `Connected`; typing is only
/// advertised on a joined session.
pub struct ModeMatchesConnection;

impl Invariant for ModeMatchesConnection {
    fn kind(&self) -> InvariantKind {
        InvariantKind::ModeMatchesConnection
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let expected = match client.mode {
                SessionMode::NotJoined => ConnectionState::Disconnected,
                SessionMode::Joining => ConnectionState::Connecting,
                SessionMode::Joined => ConnectionState::Connected,
            };
            if client.connection_state != expected {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!(
                        "client {}: mode {:?} with connection {:?}",
                        client.id, client.mode, client.connection_state
                    ),
                });
            }
            if client.local_typing && client.mode != SessionMode::Joined {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!("client {}: typing while {:?}", client.id, client.mode),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use parley_core::message_log::MessageId;
    use parley_proto::User;

    use super::*;
    use crate::invariants::SessionSnapshot;

    fn joined(username: &str) -> SessionSnapshot {
        SessionSnapshot {
            mode: SessionMode::Joined,
            connection_state: ConnectionState::Connected,
            username: Some(username.into()),
            roster: vec![User::new("1", username)],
            ..SessionSnapshot::default()
        }
    }

    #[test]
    fn local_typing_detected() {
        let mut client = joined("alice");
        client.typing = vec!["alice".into()];
        let state = SystemSnapshot::from_clients(vec![client]);

        let err = LocalNeverTyping.check(&state).unwrap_err();
        assert_eq!(err.invariant, InvariantKind::LocalNeverTyping);
    }

    #[test]
    fn others_typing_is_fine() {
        let mut client = joined("alice");
        client.typing = vec!["bob".into()];
        let state = SystemSnapshot::from_clients(vec![client]);

        assert!(LocalNeverTyping.check(&state).is_ok());
    }

    #[test]
    fn duplicate_ids_detected() {
        let mut client = joined("alice");
        client.message_ids = vec![MessageId::from("m1"), MessageId::from("m1")];
        let state = SystemSnapshot::from_clients(vec![client]);

        assert!(UniqueMessageIds.check(&state).is_err());
    }

    #[test]
    fn leftover_roster_detected() {
        let client = SessionSnapshot {
            roster: vec![User::new("1", "alice")],
            ..SessionSnapshot::default()
        };
        let state = SystemSnapshot::from_clients(vec![client]);

        assert!(IdleWhenNotJoined.check(&state).is_err());
    }

    #[test]
    fn joining_must_be_connecting() {
        let client = SessionSnapshot {
            mode: SessionMode::Joining,
            connection_state: ConnectionState::Connected,
            ..SessionSnapshot::default()
        };
        let state = SystemSnapshot::from_clients(vec![client]);

        assert!(ModeMatchesConnection.check(&state).is_err());
    }

    #[test]
    fn typing_while_joining_detected() {
        let client = SessionSnapshot {
            mode: SessionMode::Joining,
            connection_state: ConnectionState::Connecting,
            local_typing: true,
            ..SessionSnapshot::default()
        };
        let state = SystemSnapshot::from_clients(vec![client]);

        assert!(ModeMatchesConnection.check(&state).is_err());
    }
}
