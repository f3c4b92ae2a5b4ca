use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

use crate::error::AppError;

/// Role assigned by the identity service. The messaging core never writes
/// it; it only drives the conversation-list partner filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Enduser,
    Professional,
}

impl UserRole {
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "enduser" => Some(UserRole::Enduser),
            "professional" => Some(UserRole::Professional),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Enduser => "enduser",
            UserRole::Professional => "professional",
        }
    }
}

/// User record as stored by the identity service. Read-only here except for
/// the is_online mirror maintained by the presence layer.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub role: UserRole,
    pub is_online: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn from_row(row: &Row) -> Result<Self, AppError> {
        let role_str: String = row.get("role");
        let role = UserRole::from_db(&role_str)
            .ok_or_else(|| AppError::Database(format!("invalid role in users table: {role_str}")))?;

        Ok(Self {
            id: row.get("id"),
            name: row.get("name"),
            username: row.get("username"),
            role,
            is_online: row.get("is_online"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            name: self.name.clone(),
            role: self.role,
            is_online: self.is_online,
        }
    }
}

/// Projection of a user embedded in conversation-list entries.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub role: UserRole,
    pub is_online: bool,
}
