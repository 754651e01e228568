use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use super::types::RoomId;

/// Messages sent from client to server
///
/// Payload fields are optional on the wire; a missing field behaves like an
/// empty one.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Enter a room, leaving any room held before
    #[serde(rename = "join")]
    Join {
        #[serde(rename = "roomId", default)]
        room_id: Option<RoomId>,
        #[serde(rename = "userName", default)]
        user_name: Option<String>,
    },

    /// New editor contents for everyone else in the room
    #[serde(rename = "codeChange")]
    CodeChange {
        #[serde(rename = "roomId", default)]
        room_id: Option<RoomId>,
        #[serde(default)]
        code: Option<String>,
    },

    #[serde(rename = "typing")]
    Typing {
        #[serde(rename = "roomId", default)]
        room_id: Option<RoomId>,
        #[serde(rename = "userName", default)]
        user_name: Option<String>,
    },

    #[serde(rename = "languageChange")]
    LanguageChange {
        #[serde(rename = "roomId", default)]
        room_id: Option<RoomId>,
        #[serde(default)]
        language: Option<String>,
    },

    /// Leave the current room. Any payload is ignored.
    #[serde(rename = "leaveRoom")]
    LeaveRoom(Option<IgnoredAny>),
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// Full membership of the room, in join order
    #[serde(rename = "userJoined")]
    UserJoined(Vec<String>),

    #[serde(rename = "codeUpdate")]
    CodeUpdate(String),

    #[serde(rename = "userTyping")]
    UserTyping(String),

    #[serde(rename = "languageUpdate")]
    LanguageUpdate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_join() {
        let json = r#"{"event": "join", "data": {"roomId": "r1", "userName": "alice"}}"#;
        let msg: ClientEvent = serde_json::from_str(json).unwrap();
        if let ClientEvent::Join { room_id, user_name } = msg {
            assert_eq!(room_id, Some(RoomId::from("r1")));
            assert_eq!(user_name.as_deref(), Some("alice"));
        } else {
            panic!("Expected Join");
        }
    }

    #[test]
    fn parse_code_change_keeps_code_verbatim() {
        let json = r#"{"event": "codeChange", "data": {"roomId": "r1", "code": "fn main() {\n\t\"hi\"\n}"}}"#;
        let msg: ClientEvent = serde_json::from_str(json).unwrap();
        if let ClientEvent::CodeChange { code, .. } = msg {
            assert_eq!(code.as_deref(), Some("fn main() {\n\t\"hi\"\n}"));
        } else {
            panic!("Expected CodeChange");
        }
    }

    #[test]
    fn parse_missing_room_id() {
        let json = r#"{"event": "typing", "data": {"userName": "bob"}}"#;
        let msg: ClientEvent = serde_json::from_str(json).unwrap();
        if let ClientEvent::Typing { room_id, user_name } = msg {
            assert!(room_id.is_none());
            assert_eq!(user_name.as_deref(), Some("bob"));
        } else {
            panic!("Expected Typing");
        }
    }

    #[test]
    fn parse_language_change() {
        let json = r#"{"event": "languageChange", "data": {"roomId": "r1", "language": "python"}}"#;
        let msg: ClientEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(
            msg,
            ClientEvent::LanguageChange { language: Some(ref l), .. } if l == "python"
        ));
    }

    #[test]
    fn parse_leave_room_with_any_payload() {
        for json in [
            r#"{"event": "leaveRoom"}"#,
            r#"{"event": "leaveRoom", "data": null}"#,
            r#"{"event": "leaveRoom", "data": {}}"#,
            r#"{"event": "leaveRoom", "data": {"roomId": "r1"}}"#,
        ] {
            let msg: ClientEvent = serde_json::from_str(json).unwrap();
            assert!(matches!(msg, ClientEvent::LeaveRoom(_)), "{}", json);
        }
    }

    #[test]
    fn reject_unknown_event() {
        let result = serde_json::from_str::<ClientEvent>(r#"{"event": "shutdown", "data": {}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn reject_non_string_room_id() {
        let json = r#"{"event": "codeChange", "data": {"roomId": 7, "code": "x"}}"#;
        assert!(serde_json::from_str::<ClientEvent>(json).is_err());
    }

    #[test]
    fn serialize_user_joined() {
        let msg = ServerEvent::UserJoined(vec!["alice".to_string(), "bob".to_string()]);
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"event":"userJoined","data":["alice","bob"]}"#);
    }

    #[test]
    fn serialize_code_update() {
        let msg = ServerEvent::CodeUpdate("print(1)".to_string());
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"event":"codeUpdate","data":"print(1)"}"#);
    }

    #[test]
    fn serialize_typing_and_language() {
        let typing = serde_json::to_string(&ServerEvent::UserTyping("bob".to_string())).unwrap();
        assert!(typing.contains("userTyping"));
        assert!(typing.contains("bob"));

        let lang = serde_json::to_string(&ServerEvent::LanguageUpdate("rust".to_string())).unwrap();
        assert_eq!(lang, r#"{"event":"languageUpdate","data":"rust"}"#);
    }
}
