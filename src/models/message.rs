use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

use crate::error::AppError;

/// Supported message payload kinds. Anything else is rejected at the API
/// boundary before the store is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
}

impl MessageType {
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "text" => Ok(MessageType::Text),
            "image" => Ok(MessageType::Image),
            other => Err(AppError::InvalidType(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Image => "image",
        }
    }
}

/// One record of the append-only message log. Immutable after insert except
/// for `is_read`, which transitions false to true exactly once.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: Uuid,
    /// Store-assigned monotonic sequence; the authoritative order, with
    /// `created_at` kept for display only.
    pub seq: i64,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn from_row(row: &Row) -> Result<Self, AppError> {
        let type_str: String = row.get("message_type");
        let message_type = MessageType::parse(&type_str)
            .map_err(|_| AppError::Database(format!("invalid message_type in store: {type_str}")))?;

        Ok(Self {
            id: row.get("id"),
            seq: row.get("seq"),
            sender_id: row.get("sender_id"),
            receiver_id: row.get("receiver_id"),
            content: row.get("content"),
            message_type,
            is_read: row.get("is_read"),
            created_at: row.get("created_at"),
        })
    }

    /// The other party of this message from `viewer`'s perspective.
    pub fn partner_of(&self, viewer: Uuid) -> Uuid {
        if self.sender_id == viewer {
            self.receiver_id
        } else {
            self.sender_id
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_supported_types() {
        assert_eq!(MessageType::parse("text").unwrap(), MessageType::Text);
        assert_eq!(MessageType::parse("image").unwrap(), MessageType::Image);
    }

    #[test]
    fn test_parse_rejects_unsupported_type() {
        let err = MessageType::parse("video").unwrap_err();
        assert!(matches!(err, AppError::InvalidType(ref t) if t == "video"));
    }

    #[test]
    fn test_partner_of_either_direction() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let msg = Message {
            id: Uuid::new_v4(),
            seq: 1,
            sender_id: a,
            receiver_id: b,
            content: "hello".into(),
            message_type: MessageType::Text,
            is_read: false,
            created_at: Utc::now(),
        };

        assert_eq!(msg.partner_of(a), b);
        assert_eq!(msg.partner_of(b), a);
    }
}
