use std::fmt;
use std::sync::Arc;

use axum::extract::ws::Utf8Bytes;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Relay server errors
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

const CLIENT_ID_PREFIX: &[u8] = b"conn_";
const CLIENT_ID_LEN: usize = 21;
const HEX_CHARS: &[u8] = b"0123456789abcdef";

/// Connection id: 21-byte fixed array ("conn_" + 16 hex)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId {
    bytes: [u8; CLIENT_ID_LEN],
    len: u8,
}

impl ClientId {
    pub fn generate() -> Self {
        let mut bytes = [0u8; CLIENT_ID_LEN];
        let prefix = CLIENT_ID_PREFIX.len();
        bytes[..prefix].copy_from_slice(CLIENT_ID_PREFIX);

        let mut rng = rand::rng();
        let value: u64 = rng.random();

        for (i, byte) in bytes[prefix..].iter_mut().enumerate() {
            let nibble = ((value >> (60 - i * 4)) & 0xF) as usize;
            *byte = HEX_CHARS[nibble];
        }
        Self {
            bytes,
            len: CLIENT_ID_LEN as u8,
        }
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        let mut bytes = [0u8; CLIENT_ID_LEN];
        let src = s.as_bytes();
        let len = src.len().min(CLIENT_ID_LEN);
        bytes[..len].copy_from_slice(&src[..len]);
        Self {
            bytes,
            len: len as u8,
        }
    }
}

impl Serialize for ClientId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Room key. Any client-supplied string names a room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(Arc<str>);

impl RoomId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl Serialize for RoomId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RoomId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(RoomId::from(s))
    }
}

/// The room and display name a session currently holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined {
    pub room: RoomId,
    pub user_name: String,
}

/// Per-connection state: `None` while unjoined.
///
/// Owned by the connection task. The coordinator never stores which room a
/// client is in; it is told on every leave and disconnect.
#[derive(Debug, Default)]
pub struct Session {
    joined: Option<Joined>,
}

impl Session {
    pub fn current(&self) -> Option<&Joined> {
        self.joined.as_ref()
    }

    /// Enter `room` as `user_name`, returning the room held before.
    pub fn enter(&mut self, room: RoomId, user_name: String) -> Option<Joined> {
        self.joined.replace(Joined { room, user_name })
    }

    /// Back to unjoined, returning the room held before.
    pub fn clear(&mut self) -> Option<Joined> {
        self.joined.take()
    }
}

/// Wrapper for outbound WebSocket messages using axum's Utf8Bytes.
#[derive(Debug, Clone)]
pub struct OutboundMessage(Utf8Bytes);

impl OutboundMessage {
    /// Create a new outbound message from any string type
    pub fn new(s: impl Into<Utf8Bytes>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Get the inner Utf8Bytes for Message::Text
    pub fn into_inner(self) -> Utf8Bytes {
        self.0
    }
}

impl From<String> for OutboundMessage {
    fn from(s: String) -> Self {
        Self(Utf8Bytes::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_id_generate_has_correct_format() {
        let id = ClientId::generate();
        assert!(id.as_str().starts_with("conn_"));
        assert_eq!(id.as_str().len(), 21);
        assert!(id.as_str()[5..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn client_ids_differ() {
        assert_ne!(ClientId::generate(), ClientId::generate());
    }

    #[test]
    fn client_id_from_str() {
        let id = ClientId::from("conn_alice");
        assert_eq!(id.as_str(), "conn_alice");
        assert_eq!(format!("{}", id), "conn_alice");
    }

    #[test]
    fn client_id_serialization() {
        let id = ClientId::from("conn_0123456789abcdef");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"conn_0123456789abcdef\"");
    }

    #[test]
    fn room_id_accepts_arbitrary_strings() {
        let room: RoomId = serde_json::from_str("\"any room / 🦀\"").unwrap();
        assert_eq!(room.as_str(), "any room / 🦀");
        assert!(!room.is_empty());
        assert!(RoomId::from("").is_empty());
    }

    #[test]
    fn session_tracks_one_room() {
        let mut session = Session::default();
        assert!(session.current().is_none());

        assert_eq!(session.enter(RoomId::from("r1"), "alice".to_string()), None);
        let prior = session.enter(RoomId::from("r2"), "alice".to_string());
        assert_eq!(prior.map(|j| j.room), Some(RoomId::from("r1")));
        assert_eq!(session.current().map(|j| j.room.as_str()), Some("r2"));

        assert!(session.clear().is_some());
        assert!(session.clear().is_none());
    }
}
