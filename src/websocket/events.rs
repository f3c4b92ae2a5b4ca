use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Message, MessageType};
use crate::websocket::PresenceRegistry;

/// Events the server emits over the real-time channel. Only one event type
/// exists in this core.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum WsServerEvent {
    #[serde(rename = "new-message")]
    NewMessage(NewMessagePayload),
}

#[derive(Debug, Clone, Serialize)]
pub struct NewMessagePayload {
    pub sender: Uuid,
    pub content: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub timestamp: DateTime<Utc>,
}

impl WsServerEvent {
    pub fn new_message(message: &Message) -> Self {
        WsServerEvent::NewMessage(NewMessagePayload {
            sender: message.sender_id,
            content: message.content.clone(),
            message_type: message.message_type,
            timestamp: message.created_at,
        })
    }
}

/// Best-effort push of a freshly persisted message to its receiver.
///
/// The message is already durable; an offline receiver, a serialization
/// hiccup or a dead connection all degrade to "fetched on next connect"
/// and never surface past this function.
pub async fn push_new_message(registry: &PresenceRegistry, message: &Message) {
    let event = WsServerEvent::new_message(message);

    let payload = match serde_json::to_string(&event) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, message_id = %message.id, "failed to encode push event");
            return;
        }
    };

    let delivered = registry.push(message.receiver_id, payload).await;
    tracing::debug!(
        message_id = %message.id,
        receiver_id = %message.receiver_id,
        delivered,
        "push attempted"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_message_event_wire_shape() {
        let message = Message {
            id: Uuid::new_v4(),
            seq: 7,
            sender_id: Uuid::new_v4(),
            receiver_id: Uuid::new_v4(),
            content: "see you at the hearing".into(),
            message_type: MessageType::Text,
            is_read: false,
            created_at: Utc::now(),
        };

        let event = WsServerEvent::new_message(&message);
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["event"], "new-message");
        assert_eq!(value["data"]["sender"], message.sender_id.to_string());
        assert_eq!(value["data"]["content"], "see you at the hearing");
        assert_eq!(value["data"]["type"], "text");
        assert!(value["data"]["timestamp"].is_string());
    }
}
