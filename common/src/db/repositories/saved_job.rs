// Saved-for-later repository implementation

use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::{SaveOutcome, SavedForLater, SavedStatus};
use crate::store::SavedJobStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::instrument;

const SAVED_COLUMNS: &str =
    "id::TEXT AS id, user_id, external_id, saved_at, status, last_reminded_at";

/// Repository for the `saved_jobs` table
#[derive(Clone)]
pub struct SavedJobRepository {
    pool: DbPool,
}

impl SavedJobRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> Result<SavedForLater, DatabaseError> {
        let status: String = row.try_get("status")?;
        Ok(SavedForLater {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            external_id: row.try_get("external_id")?,
            saved_at: row.try_get("saved_at")?,
            status: status
                .parse::<SavedStatus>()
                .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
            last_reminded_at: row.try_get("last_reminded_at")?,
        })
    }
}

#[async_trait]
impl SavedJobStore for SavedJobRepository {
    /// The `(user_id, external_id)` unique constraint makes re-saving a no-op
    #[instrument(skip(self))]
    async fn save(&self, user_id: &str, external_id: &str) -> Result<SaveOutcome, DatabaseError> {
        let result = sqlx::query(
            r#"
            INSERT INTO saved_jobs (user_id, external_id, saved_at, status)
            VALUES ($1, $2, NOW(), $3)
            ON CONFLICT (user_id, external_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(external_id)
        .bind(SavedStatus::Pending.as_str())
        .execute(self.pool.pool())
        .await?;

        Ok(if result.rows_affected() == 0 {
            SaveOutcome::AlreadyExists
        } else {
            SaveOutcome::Saved
        })
    }

    #[instrument(skip(self))]
    async fn remove(&self, user_id: &str, external_id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM saved_jobs WHERE user_id = $1 AND external_id = $2")
            .bind(user_id)
            .bind(external_id)
            .execute(self.pool.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<SavedForLater>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM saved_jobs WHERE user_id = $1 ORDER BY saved_at DESC",
            SAVED_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(self.pool.pool())
            .await?;
        rows.iter().map(Self::map_row).collect()
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<SavedForLater>, DatabaseError> {
        let sql = format!("SELECT {} FROM saved_jobs ORDER BY id", SAVED_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(self.pool.pool()).await?;
        rows.iter().map(Self::map_row).collect()
    }

    #[instrument(skip(self))]
    async fn count_for_user(&self, user_id: &str) -> Result<i64, DatabaseError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM saved_jobs WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool.pool())
            .await?;
        Ok(row.try_get("count")?)
    }

    #[instrument(skip(self))]
    async fn is_saved(&self, user_id: &str, external_id: &str) -> Result<bool, DatabaseError> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM saved_jobs WHERE user_id = $1 AND external_id = $2) AS saved",
        )
        .bind(user_id)
        .bind(external_id)
        .fetch_one(self.pool.pool())
        .await?;
        Ok(row.try_get("saved")?)
    }

    #[instrument(skip(self))]
    async fn mark_reminded(
        &self,
        user_id: &str,
        external_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            "UPDATE saved_jobs SET last_reminded_at = $3 WHERE user_id = $1 AND external_id = $2",
        )
        .bind(user_id)
        .bind(external_id)
        .bind(at)
        .execute(self.pool.pool())
        .await?;
        Ok(())
    }
}
