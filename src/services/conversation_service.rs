//! # Conversation Service
//!
//! Derives the recent-conversations view from the message log. Nothing here
//! is persisted: the view is recomputed on every request by one pass over a
//! recency-ordered stream of the viewer's messages, so it is always correct
//! as of the read snapshot.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Message, User, UserRole, UserSummary};
use crate::services::user_service::UserService;

/// Which partners a viewer's conversation list may contain. This is policy,
/// not mechanism: the platform pairs endusers with professionals, but the
/// aggregation itself works with any predicate.
pub struct PartnerPolicy(Box<dyn Fn(UserRole, UserRole) -> bool + Send + Sync>);

impl PartnerPolicy {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(UserRole, UserRole) -> bool + Send + Sync + 'static,
    {
        Self(Box::new(predicate))
    }

    /// Endusers see professionals and vice versa.
    pub fn complementary_roles() -> Self {
        Self::new(|viewer, partner| viewer != partner)
    }

    /// No filtering.
    pub fn any() -> Self {
        Self::new(|_, _| true)
    }

    pub fn allows(&self, viewer: UserRole, partner: UserRole) -> bool {
        (self.0)(viewer, partner)
    }
}

/// One entry of the derived conversation list, from the viewer's side.
#[derive(Debug, Clone, Serialize)]
pub struct RecentConversation {
    pub partner: UserSummary,
    pub last_message: Message,
    pub last_message_time: DateTime<Utc>,
}

pub struct ConversationService;

impl ConversationService {
    /// Collapse a recency-ordered (descending seq) message stream to the
    /// most recent message per conversation partner.
    ///
    /// First-seen-wins: because the input is recency-ordered, the first
    /// message observed for a partner is that conversation's latest, and
    /// every later one is discarded. One pass, space bounded by the number
    /// of distinct partners, and the output preserves recency order.
    pub fn latest_per_partner(viewer: Uuid, messages: Vec<Message>) -> Vec<Message> {
        let mut seen: HashSet<Uuid> = HashSet::new();
        let mut latest = Vec::new();

        for message in messages {
            let partner = message.partner_of(viewer);
            if seen.insert(partner) {
                latest.push(message);
            }
        }

        latest
    }

    /// The viewer's conversation list, descending by recency.
    ///
    /// Partner ids that no longer resolve to a user record are dropped, and
    /// partners the policy rejects are filtered out after resolution.
    pub async fn recent_conversations(
        db: &Pool,
        viewer: Uuid,
        policy: &PartnerPolicy,
    ) -> Result<Vec<RecentConversation>, AppError> {
        let viewer_user = UserService::find_by_id(db, viewer)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let messages = Self::messages_involving(db, viewer).await?;
        let latest = Self::latest_per_partner(viewer, messages);

        let partner_ids: Vec<Uuid> = latest.iter().map(|m| m.partner_of(viewer)).collect();
        let partners: HashMap<Uuid, User> = UserService::find_by_ids(db, &partner_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let conversations = latest
            .into_iter()
            .filter_map(|message| {
                let partner = partners.get(&message.partner_of(viewer))?;
                if !policy.allows(viewer_user.role, partner.role) {
                    return None;
                }
                Some(RecentConversation {
                    partner: partner.summary(),
                    last_message_time: message.created_at,
                    last_message: message,
                })
            })
            .collect();

        Ok(conversations)
    }

    /// Every message the viewer sent or received, descending by sequence
    /// number. No LIMIT here: truncating this scan would silently drop
    /// whole conversations from the derived list.
    async fn messages_involving(db: &Pool, viewer: Uuid) -> Result<Vec<Message>, AppError> {
        let client = db.get().await?;

        let rows = client
            .query(
                r#"
                SELECT id, seq, sender_id, receiver_id, content, message_type, is_read, created_at
                FROM messages
                WHERE sender_id = $1 OR receiver_id = $1
                ORDER BY seq DESC
                "#,
                &[&viewer],
            )
            .await?;

        rows.iter().map(Message::from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageType;
    use chrono::Duration;

    fn message(seq: i64, sender: Uuid, receiver: Uuid) -> Message {
        Message {
            id: Uuid::new_v4(),
            seq,
            sender_id: sender,
            receiver_id: receiver,
            content: format!("message {seq}"),
            message_type: MessageType::Text,
            is_read: false,
            created_at: Utc::now() + Duration::seconds(seq),
        }
    }

    /// Messages sorted descending by seq, as the store query returns them.
    fn recency_ordered(mut messages: Vec<Message>) -> Vec<Message> {
        messages.sort_by(|a, b| b.seq.cmp(&a.seq));
        messages
    }

    #[test]
    fn test_empty_stream_yields_empty_list() {
        let viewer = Uuid::new_v4();
        assert!(ConversationService::latest_per_partner(viewer, vec![]).is_empty());
    }

    #[test]
    fn test_at_most_one_entry_per_partner_with_max_seq() {
        let viewer = Uuid::new_v4();
        let partner = Uuid::new_v4();

        // A sends 3, B replies once, interleaved
        let stream = recency_ordered(vec![
            message(1, viewer, partner),
            message(2, viewer, partner),
            message(3, partner, viewer),
            message(4, viewer, partner),
        ]);

        let latest = ConversationService::latest_per_partner(viewer, stream);

        assert_eq!(latest.len(), 1);
        // The surviving entry carries the maximum sequence number
        assert_eq!(latest[0].seq, 4);
        assert_eq!(latest[0].sender_id, viewer);
    }

    #[test]
    fn test_partner_reply_wins_when_most_recent() {
        let viewer = Uuid::new_v4();
        let partner = Uuid::new_v4();

        let stream = recency_ordered(vec![
            message(1, viewer, partner),
            message(2, viewer, partner),
            message(3, viewer, partner),
            message(4, partner, viewer),
        ]);

        let latest = ConversationService::latest_per_partner(viewer, stream);

        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].seq, 4);
        assert_eq!(latest[0].sender_id, partner);
    }

    #[test]
    fn test_multiple_partners_preserve_recency_order() {
        let viewer = Uuid::new_v4();
        let older_partner = Uuid::new_v4();
        let newer_partner = Uuid::new_v4();

        let stream = recency_ordered(vec![
            message(1, viewer, older_partner),
            message(2, older_partner, viewer),
            message(3, newer_partner, viewer),
        ]);

        let latest = ConversationService::latest_per_partner(viewer, stream);

        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].partner_of(viewer), newer_partner);
        assert_eq!(latest[0].seq, 3);
        assert_eq!(latest[1].partner_of(viewer), older_partner);
        assert_eq!(latest[1].seq, 2);
    }

    #[test]
    fn test_single_pass_is_linear_in_messages() {
        let viewer = Uuid::new_v4();
        let partners: Vec<Uuid> = (0..10).map(|_| Uuid::new_v4()).collect();

        let mut stream = Vec::new();
        for seq in 0..1000 {
            let partner = partners[(seq % 10) as usize];
            stream.push(message(seq, viewer, partner));
        }

        let latest = ConversationService::latest_per_partner(viewer, recency_ordered(stream));

        // one entry per distinct partner, nothing double-counted
        assert_eq!(latest.len(), partners.len());
        let unique: HashSet<Uuid> = latest.iter().map(|m| m.partner_of(viewer)).collect();
        assert_eq!(unique.len(), partners.len());
    }

    #[test]
    fn test_complementary_role_policy() {
        let policy = PartnerPolicy::complementary_roles();

        assert!(policy.allows(UserRole::Enduser, UserRole::Professional));
        assert!(policy.allows(UserRole::Professional, UserRole::Enduser));
        assert!(!policy.allows(UserRole::Enduser, UserRole::Enduser));
        assert!(!policy.allows(UserRole::Professional, UserRole::Professional));
    }

    #[test]
    fn test_any_policy_allows_everything() {
        let policy = PartnerPolicy::any();

        assert!(policy.allows(UserRole::Enduser, UserRole::Enduser));
        assert!(policy.allows(UserRole::Enduser, UserRole::Professional));
    }
}
