// Read-only access to user profiles maintained by the authentication service

use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::UserProfile;
use crate::store::ProfileStore;
use async_trait::async_trait;
use sqlx::Row;
use tracing::instrument;

#[derive(Clone)]
pub struct ProfileRepository {
    pool: DbPool,
}

impl ProfileRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for ProfileRepository {
    #[instrument(skip(self))]
    async fn find_profile(&self, user_id: &str) -> Result<Option<UserProfile>, DatabaseError> {
        let row = sqlx::query("SELECT id, email, skills, push_token FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(self.pool.pool())
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(UserProfile {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            skills: row.try_get("skills")?,
            push_token: row
                .try_get::<Option<String>, _>("push_token")?
                .filter(|t| !t.is_empty()),
        }))
    }
}
