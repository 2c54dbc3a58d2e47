//! Directional frame enums and their JSON codec.
//!
//! Frames are adjacently tagged: the variant name goes in `event` and the
//! payload in `data`. Each direction has its own enum so an inbound `message`
//! (with sender, id and timestamp) can never be confused with an outbound
//! `message` (text only).
//!
//! # Invariants
//!
//! - One JSON object per frame, no trailing data.
//! - Unknown event names are rejected as [`ProtocolError::Decode`].

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    errors::{ProtocolError, Result},
    payloads::{
        ChatMessage, Join, OutgoingMessage, Roster, SystemMessage, TypingState, TypingUpdate,
        Welcome,
    },
};

/// Events sent from the client to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientFrame {
    /// Join with the given display name.
    Join(Join),
    /// Send a chat message as the joined user.
    Message(OutgoingMessage),
    /// Local typing-state change.
    Typing(TypingState),
}

impl ClientFrame {
    /// `join` frame for `username`.
    pub fn join(username: impl Into<String>) -> Self {
        Self::Join(Join { username: username.into() })
    }

    /// `message` frame carrying `message`.
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(OutgoingMessage { message: message.into() })
    }

    /// `typing` frame.
    pub fn typing(is_typing: bool) -> Self {
        Self::Typing(TypingState { is_typing })
    }

    /// Wire event name.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Join(_) => "join",
            Self::Message(_) => "message",
            Self::Typing(_) => "typing",
        }
    }

    /// Encode as a JSON text frame.
    pub fn encode(&self) -> Result<String> {
        encode(self)
    }

    /// Decode a JSON text frame.
    pub fn decode(text: &str) -> Result<Self> {
        decode(text)
    }
}

/// Events pushed from the relay to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerFrame {
    /// Handshake acknowledgment for a `join`.
    Welcome(Welcome),
    /// Full roster replacement.
    Roster(Roster),
    /// Chat message to append.
    Message(ChatMessage),
    /// System notice to append.
    SystemMessage(SystemMessage),
    /// Current set of users typing.
    Typing(TypingUpdate),
}

impl ServerFrame {
    /// Wire event name.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Welcome(_) => "welcome",
            Self::Roster(_) => "roster",
            Self::Message(_) => "message",
            Self::SystemMessage(_) => "system-message",
            Self::Typing(_) => "typing",
        }
    }

    /// Encode as a JSON text frame.
    pub fn encode(&self) -> Result<String> {
        encode(self)
    }

    /// Decode a JSON text frame.
    pub fn decode(text: &str) -> Result<Self> {
        decode(text)
    }
}

fn encode<T: Serialize>(frame: &T) -> Result<String> {
    serde_json::to_string(frame).map_err(|e| ProtocolError::Encode(e.to_string()))
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| ProtocolError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::User;

    #[test]
    fn client_frames_match_relay_contract() {
        insta::assert_snapshot!(
            ClientFrame::join("alice").encode().unwrap(),
            @r#"{"event":"join","data":{"username":"alice"}}"#
        );
        insta::assert_snapshot!(
            ClientFrame::message("hi").encode().unwrap(),
            @r#"{"event":"message","data":{"message":"hi"}}"#
        );
        insta::assert_snapshot!(
            ClientFrame::typing(true).encode().unwrap(),
            @r#"{"event":"typing","data":{"isTyping":true}}"#
        );
    }

    #[test]
    fn server_frames_match_relay_contract() {
        let timestamp = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        insta::assert_snapshot!(
            ServerFrame::SystemMessage(SystemMessage {
                id: "s1".into(),
                message: "alice joined".into(),
                timestamp,
            })
            .encode()
            .unwrap(),
            @r#"{"event":"system-message","data":{"id":"s1","message":"alice joined","timestamp":"2023-11-14T22:13:20Z"}}"#
        );
        insta::assert_snapshot!(
            ServerFrame::Roster(Roster { users: vec![User::new("1", "alice")] }).encode().unwrap(),
            @r#"{"event":"roster","data":{"users":[{"id":"1","username":"alice"}]}}"#
        );
    }

    #[test]
    fn decodes_relay_message_with_offset_timestamp() {
        let text = concat!(
            r#"{"event":"message","data":{"id":"m1","sender":"bob","message":"hi","#,
            r#""timestamp":"2023-11-14T23:13:20+01:00"}}"#,
        );

        let frame = ServerFrame::decode(text).unwrap();

        let ServerFrame::Message(msg) = frame else {
            panic!("expected message frame, got {frame:?}");
        };
        assert_eq!(msg.sender, "bob");
        assert_eq!(msg.timestamp, Utc.timestamp_opt(1_700_000_000, 0).unwrap());
    }

    #[test]
    fn unknown_event_is_rejected() {
        let result = ServerFrame::decode(r#"{"event":"reaction","data":{}}"#);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn outbound_message_is_not_a_server_message() {
        let text = ClientFrame::message("hi").encode().unwrap();
        assert!(ServerFrame::decode(&text).is_err());
    }

    #[test]
    fn event_names_follow_wire_tags() {
        let typing = ServerFrame::Typing(TypingUpdate { usernames: vec![] });
        assert_eq!(typing.event_name(), "typing");
        assert!(typing.encode().unwrap().contains(r#""event":"typing""#));
        assert_eq!(ClientFrame::join("a").event_name(), "join");
    }
}
