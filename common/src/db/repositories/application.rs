// Job application repository implementation

use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::{Application, ApplicationStatus};
use crate::store::ApplicationStore;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::instrument;

#[derive(Clone)]
pub struct ApplicationRepository {
    pool: DbPool,
}

impl ApplicationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> Result<Application, DatabaseError> {
        let status: String = row.try_get("status")?;
        Ok(Application {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            external_id: row.try_get("external_id")?,
            status: status
                .parse::<ApplicationStatus>()
                .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
            applied_at: row.try_get("applied_at")?,
        })
    }
}

#[async_trait]
impl ApplicationStore for ApplicationRepository {
    #[instrument(skip(self))]
    async fn create(
        &self,
        user_id: &str,
        external_id: &str,
    ) -> Result<Application, DatabaseError> {
        let row = sqlx::query(
            r#"
            INSERT INTO applications (user_id, external_id, status, applied_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id::TEXT AS id, user_id, external_id, status, applied_at
            "#,
        )
        .bind(user_id)
        .bind(external_id)
        .bind(ApplicationStatus::Pending.as_str())
        .fetch_one(self.pool.pool())
        .await?;

        let application = Self::map_row(&row)?;
        tracing::info!(application_id = %application.id, "Application created");
        Ok(application)
    }

    #[instrument(skip(self))]
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Application>, DatabaseError> {
        let rows = sqlx::query(
            r#"
            SELECT id::TEXT AS id, user_id, external_id, status, applied_at
            FROM applications
            WHERE user_id = $1
            ORDER BY applied_at DESC
            LIMIT 100
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool.pool())
        .await?;

        rows.iter().map(Self::map_row).collect()
    }
}
