use serde::Serialize;
use std::fmt;

/// One message block of the dump, cut into its four fields but not yet normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Zero-based position of the block in the dump
    pub index: usize,
    pub timestamp_text: String,
    pub chat_id_text: String,
    pub sender_text: String,
    pub payload_bytes: Vec<u8>,
}

/// A fully extracted message, ready to be handed to the delivery sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEvent {
    pub index: usize,
    pub message_id: String,
    pub epoch_timestamp: i64,
    pub chat_id: String,
    pub network: String,
    pub sender_id: String,
    // Same value as sender_id today; the platform expects both keys.
    pub sender_username: String,
    pub payload: Vec<u8>,
}

impl NormalizedEvent {
    /// Builds the metadata document submitted alongside the payload
    pub fn metadata(&self) -> EventMetadata {
        EventMetadata {
            id: self.message_id.clone(),
            date: DateMeta {
                timestamp: self.epoch_timestamp as f64,
            },
            chat: ChatMeta {
                id: self.chat_id.clone(),
            },
            network: self.network.clone(),
            sender: SenderMeta {
                id: self.sender_id.clone(),
                username: self.sender_username.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventMetadata {
    pub id: String,
    pub date: DateMeta,
    pub chat: ChatMeta,
    pub network: String,
    pub sender: SenderMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateMeta {
    /// Seconds since epoch, serialized as a float (`1609459200.0`)
    pub timestamp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMeta {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SenderMeta {
    pub id: String,
    pub username: String,
}

/// Part of a block a malformed-record error points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Block,
    Timestamp,
    ChatId,
    SenderAlias,
    Message,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Block => "block",
            Field::Timestamp => "timestamp",
            Field::ChatId => "chat_id",
            Field::SenderAlias => "sender_alias",
            Field::Message => "message",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed record #{index}, field '{field}': {reason}")]
    MalformedRecord {
        index: usize,
        field: Field,
        reason: String,
    },
}

impl ParseError {
    pub fn malformed(index: usize, field: Field, reason: impl Into<String>) -> Self {
        ParseError::MalformedRecord {
            index,
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> NormalizedEvent {
        NormalizedEvent {
            index: 0,
            message_id: "29858f44-a4cc-59a7-a0b8-d6dd549766d5".to_string(),
            epoch_timestamp: 1_609_459_200,
            chat_id: "!room1:example.org".to_string(),
            network: "example.org".to_string(),
            sender_id: "@alice:example.org".to_string(),
            sender_username: "@alice:example.org".to_string(),
            payload: b"hello".to_vec(),
        }
    }

    #[test]
    fn test_metadata_json_shape() {
        let meta = sample_event().metadata();
        let json = serde_json::to_value(&meta).unwrap();

        assert_eq!(json["id"], "29858f44-a4cc-59a7-a0b8-d6dd549766d5");
        assert_eq!(json["date"]["timestamp"], 1_609_459_200.0);
        assert_eq!(json["chat"]["id"], "!room1:example.org");
        assert_eq!(json["network"], "example.org");
        assert_eq!(json["sender"]["id"], "@alice:example.org");
        assert_eq!(json["sender"]["username"], "@alice:example.org");
    }

    #[test]
    fn test_metadata_timestamp_renders_as_float() {
        let text = serde_json::to_string(&sample_event().metadata()).unwrap();
        assert!(text.contains(r#""timestamp":1609459200.0"#));
    }

    #[test]
    fn test_malformed_error_message_names_record_and_field() {
        let err = ParseError::malformed(3, Field::ChatId, "missing network segment");
        assert_eq!(
            err.to_string(),
            "Malformed record #3, field 'chat_id': missing network segment"
        );
    }
}
