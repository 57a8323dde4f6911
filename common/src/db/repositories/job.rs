// Job repository implementation
// Upsert-by-external-id is the only write path into the job corpus.

use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::{Deadline, JobFilter, JobPosting, JobRecord, UpsertOutcome};
use crate::store::JobStore;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::instrument;

const JOB_COLUMNS: &str = r#"
    id::TEXT AS id, external_id, title, company_name, location, is_remote,
    description, posting_url, date_posted, application_deadline, raw_payload,
    created_at, updated_at
"#;

/// Repository for job-related database operations
#[derive(Clone)]
pub struct JobRepository {
    pool: DbPool,
}

impl JobRepository {
    /// Create a new JobRepository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> Result<JobRecord, DatabaseError> {
        let deadline: Option<serde_json::Value> = row.try_get("application_deadline")?;
        let application_deadline = deadline
            .filter(|v| !v.is_null())
            .map(serde_json::from_value::<Deadline>)
            .transpose()
            .map_err(|e| {
                DatabaseError::QueryFailed(format!("Failed to parse application_deadline: {}", e))
            })?;

        Ok(JobRecord {
            id: row.try_get("id")?,
            posting: JobPosting {
                external_id: row.try_get("external_id")?,
                title: row.try_get("title")?,
                company_name: row.try_get("company_name")?,
                location: row.try_get("location")?,
                is_remote: row.try_get("is_remote")?,
                description: row.try_get("description")?,
                posting_url: row.try_get("posting_url")?,
                date_posted: row.try_get("date_posted")?,
                application_deadline,
                raw_payload: row.try_get("raw_payload")?,
            },
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl JobStore for JobRepository {
    /// `ON CONFLICT (external_id) DO UPDATE` is atomic per row, so overlapping
    /// reconciliations of the same posting resolve to last-writer-wins.
    #[instrument(skip(self, posting), fields(external_id = %posting.external_id))]
    async fn upsert(&self, posting: &JobPosting) -> Result<UpsertOutcome, DatabaseError> {
        let deadline = posting
            .application_deadline
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| {
                DatabaseError::QueryFailed(format!("Failed to serialize deadline: {}", e))
            })?;

        let row = sqlx::query(
            r#"
            INSERT INTO jobs (
                external_id, title, company_name, location, is_remote,
                description, posting_url, date_posted, application_deadline, raw_payload,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW(), NOW())
            ON CONFLICT (external_id) DO UPDATE SET
                title = EXCLUDED.title,
                company_name = EXCLUDED.company_name,
                location = EXCLUDED.location,
                is_remote = EXCLUDED.is_remote,
                description = EXCLUDED.description,
                posting_url = EXCLUDED.posting_url,
                date_posted = EXCLUDED.date_posted,
                application_deadline = EXCLUDED.application_deadline,
                raw_payload = EXCLUDED.raw_payload,
                updated_at = NOW()
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(&posting.external_id)
        .bind(&posting.title)
        .bind(&posting.company_name)
        .bind(&posting.location)
        .bind(posting.is_remote)
        .bind(&posting.description)
        .bind(&posting.posting_url)
        .bind(&posting.date_posted)
        .bind(deadline)
        .bind(&posting.raw_payload)
        .fetch_one(self.pool.pool())
        .await?;

        let inserted: bool = row.try_get("inserted")?;
        Ok(if inserted {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Updated
        })
    }

    #[instrument(skip(self))]
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<JobRecord>, DatabaseError> {
        let sql = format!("SELECT {} FROM jobs WHERE external_id = $1", JOB_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(external_id)
            .fetch_optional(self.pool.pool())
            .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: &JobFilter) -> Result<Vec<JobRecord>, DatabaseError> {
        let keyword = filter.keyword.as_deref().filter(|k| !k.is_empty());
        let remote_only = filter.wants_remote();
        let location = filter
            .location
            .as_deref()
            .filter(|l| !l.is_empty() && !remote_only);

        // Literal substring match: `%` and `_` in user input are ordinary characters
        let sql = format!(
            r#"
            SELECT {}
            FROM jobs
            WHERE ($1::TEXT IS NULL OR strpos(lower(title), lower($1)) > 0)
              AND ($2::BOOLEAN = FALSE OR is_remote = TRUE)
              AND ($3::TEXT IS NULL OR strpos(lower(location), lower($3)) > 0)
            ORDER BY updated_at DESC, external_id ASC
            LIMIT $4 OFFSET $5
            "#,
            JOB_COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(keyword)
            .bind(remote_only)
            .bind(location)
            .bind(filter.effective_limit())
            .bind(filter.effective_offset())
            .fetch_all(self.pool.pool())
            .await?;

        rows.iter().map(Self::map_row).collect()
    }

    #[instrument(skip(self))]
    async fn corpus(&self, limit: i64) -> Result<Vec<JobRecord>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM jobs ORDER BY updated_at DESC, external_id ASC LIMIT $1",
            JOB_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .fetch_all(self.pool.pool())
            .await?;

        tracing::debug!(count = rows.len(), "Loaded job corpus");
        rows.iter().map(Self::map_row).collect()
    }

    #[instrument(skip(self))]
    async fn count(&self) -> Result<i64, DatabaseError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM jobs")
            .fetch_one(self.pool.pool())
            .await?;
        Ok(row.try_get("count")?)
    }
}
