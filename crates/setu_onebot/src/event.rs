use serde::{Deserialize, Serialize};

/// Inbound event frame, told apart by `post_type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "post_type")]
pub enum OneBotEvent {
    #[serde(rename = "message")]
    Message(MessageEvent),
    #[serde(rename = "meta_event")]
    Meta(MetaEvent),
    /// Notices and requests; the plugin has no use for them.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageEvent {
    pub message_type: String, // "private" or "group"
    pub message_id: i32,
    pub user_id: i64,
    pub group_id: Option<i64>,
    pub raw_message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "meta_event_type")]
pub enum MetaEvent {
    #[serde(rename = "heartbeat")]
    Heartbeat { interval: i64 },
    /// `connect`, `enable` or `disable`.
    #[serde(rename = "lifecycle")]
    Lifecycle { sub_type: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Serialize)]
pub struct SendMessageAction {
    pub action: String,
    pub params: SendMessageParams,
    pub echo: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageParams {
    pub message_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
    pub message: String,
}

/// Reply to an action, matched to it through `echo`.
#[derive(Debug, Clone, Deserialize)]
pub struct OneBotResponse {
    pub status: String,
    pub retcode: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub wording: String,
    pub echo: Option<String>,
}

impl OneBotResponse {
    /// Human-readable failure text; implementations fill one field or the other.
    pub fn reason(&self) -> &str {
        if self.wording.is_empty() {
            &self.message
        } else {
            &self.wording
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_group_message() {
        let raw = r#"{
            "post_type": "message", "message_type": "group", "sub_type": "normal",
            "message_id": 10, "user_id": 1001, "group_id": 2002,
            "raw_message": "来点色色", "font": 0,
            "sender": { "user_id": 1001, "nickname": "alice" },
            "time": 1700000000, "self_id": 42
        }"#;
        match serde_json::from_str::<OneBotEvent>(raw).unwrap() {
            OneBotEvent::Message(m) => {
                assert_eq!(m.message_type, "group");
                assert_eq!(m.group_id, Some(2002));
                assert_eq!(m.raw_message, "来点色色");
            }
            other => panic!("Expected message event, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_meta_events() {
        let raw = r#"{
            "post_type": "meta_event", "meta_event_type": "lifecycle",
            "sub_type": "connect", "time": 1700000000, "self_id": 42
        }"#;
        match serde_json::from_str::<OneBotEvent>(raw).unwrap() {
            OneBotEvent::Meta(MetaEvent::Lifecycle { sub_type }) => assert_eq!(sub_type, "connect"),
            other => panic!("Expected lifecycle event, got {:?}", other),
        }

        let raw = r#"{
            "post_type": "meta_event", "meta_event_type": "heartbeat",
            "time": 1700000000, "status": {}, "interval": 5000
        }"#;
        assert!(matches!(
            serde_json::from_str::<OneBotEvent>(raw).unwrap(),
            OneBotEvent::Meta(MetaEvent::Heartbeat { interval: 5000 })
        ));
    }

    #[test]
    fn test_unhandled_post_type() {
        let raw = r#"{"post_type": "request", "request_type": "friend", "time": 1}"#;
        assert!(matches!(
            serde_json::from_str::<OneBotEvent>(raw).unwrap(),
            OneBotEvent::Other
        ));
    }

    #[test]
    fn test_action_omits_absent_target() {
        let action = SendMessageAction {
            action: "send_group_msg".into(),
            params: SendMessageParams {
                message_type: "group".into(),
                user_id: None,
                group_id: Some(7),
                message: "hi".into(),
            },
            echo: "e1".into(),
        };
        let v = serde_json::to_value(&action).unwrap();
        assert_eq!(v["params"]["group_id"], 7);
        assert!(v["params"].get("user_id").is_none());
        assert_eq!(v["echo"], "e1");
    }

    #[test]
    fn test_parse_failed_response() {
        let raw = r#"{"status":"failed","retcode":1200,"data":null,"message":"file not found","echo":"e1"}"#;
        let resp: OneBotResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.status, "failed");
        assert_eq!(resp.retcode, 1200);
        assert_eq!(resp.reason(), "file not found");
        assert_eq!(resp.echo.as_deref(), Some("e1"));
    }
}
