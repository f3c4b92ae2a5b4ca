use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::User;

/// Read-side access to the identity service's users table, plus the
/// best-effort is_online mirror written by the presence layer.
pub struct UserService;

impl UserService {
    pub async fn find_by_id(db: &Pool, id: Uuid) -> Result<Option<User>, AppError> {
        let client = db.get().await?;

        let row = client
            .query_opt(
                "SELECT id, name, username, role, is_online, created_at, updated_at \
                 FROM users WHERE id = $1",
                &[&id],
            )
            .await?;

        row.map(|r| User::from_row(&r)).transpose()
    }

    pub async fn find_by_ids(db: &Pool, ids: &[Uuid]) -> Result<Vec<User>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let client = db.get().await?;

        let rows = client
            .query(
                "SELECT id, name, username, role, is_online, created_at, updated_at \
                 FROM users WHERE id = ANY($1)",
                &[&ids],
            )
            .await?;

        rows.iter().map(User::from_row).collect()
    }

    /// Mirror of the presence state. Authoritative delivery decisions use
    /// the live registry, never this flag.
    pub async fn set_online(db: &Pool, id: Uuid, is_online: bool) -> Result<(), AppError> {
        let client = db.get().await?;

        client
            .execute(
                "UPDATE users SET is_online = $2, updated_at = NOW() WHERE id = $1",
                &[&id, &is_online],
            )
            .await?;

        Ok(())
    }
}
