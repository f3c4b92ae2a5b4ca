//! # Message Service
//!
//! The durable message store: append-only inserts, pair history reads and
//! the single-statement read-state batch. Delivery is not nested in here;
//! the HTTP layer persists first and pushes second, keeping persistence
//! and transport failures independently retryable.

use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Message, MessageType};

/// Hard cap on a single history page.
const HISTORY_MAX_LIMIT: i64 = 500;

pub struct MessageService;

impl MessageService {
    /// Persist one message. The store assigns id, sequence number and
    /// timestamp; the row comes back exactly as stored.
    pub async fn send_message_db(
        db: &Pool,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
        message_type: MessageType,
    ) -> Result<Message, AppError> {
        if content.is_empty() {
            return Err(AppError::BadRequest("message content cannot be empty".into()));
        }

        let id = Uuid::new_v4();
        let client = db.get().await?;

        let row = client
            .query_one(
                r#"
                INSERT INTO messages (id, sender_id, receiver_id, content, message_type)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, seq, sender_id, receiver_id, content, message_type, is_read, created_at
                "#,
                &[&id, &sender_id, &receiver_id, &content, &message_type.as_str()],
            )
            .await?;

        Message::from_row(&row)
    }

    /// All messages between the pair in either direction, ascending by
    /// sequence number. Restartable: pass the last seen `seq` as
    /// `after_seq` to continue where a previous page stopped.
    pub async fn history_db(
        db: &Pool,
        user_a: Uuid,
        user_b: Uuid,
        after_seq: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, AppError> {
        let after_seq = after_seq.unwrap_or(0);
        let limit = limit.unwrap_or(HISTORY_MAX_LIMIT).clamp(1, HISTORY_MAX_LIMIT);

        let client = db.get().await?;

        let rows = client
            .query(
                r#"
                SELECT id, seq, sender_id, receiver_id, content, message_type, is_read, created_at
                FROM messages
                WHERE ((sender_id = $1 AND receiver_id = $2)
                    OR (sender_id = $2 AND receiver_id = $1))
                  AND seq > $3
                ORDER BY seq ASC
                LIMIT $4
                "#,
                &[&user_a, &user_b, &after_seq, &limit],
            )
            .await?;

        rows.iter().map(Message::from_row).collect()
    }

    /// Mark the entire unread backlog from `sender_id` to `reader_id` as
    /// read. One statement, so the batch commits fully or not at all, and
    /// a second call with no new messages updates zero rows.
    pub async fn mark_read_db(
        db: &Pool,
        reader_id: Uuid,
        sender_id: Uuid,
    ) -> Result<u64, AppError> {
        let client = db.get().await?;

        let updated = client
            .execute(
                r#"
                UPDATE messages
                SET is_read = TRUE
                WHERE sender_id = $1 AND receiver_id = $2 AND is_read = FALSE
                "#,
                &[&sender_id, &reader_id],
            )
            .await?;

        Ok(updated)
    }
}
