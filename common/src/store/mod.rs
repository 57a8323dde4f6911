// Persistence seams shared by the pipeline, the scheduler and the API.
//
// Postgres repositories in `crate::db::repositories` and `MemoryStore` both
// implement these traits.

pub mod memory;

use crate::errors::DatabaseError;
use crate::models::{
    Application, JobFilter, JobPosting, JobRecord, SaveOutcome, SavedForLater, UpsertOutcome,
    UserProfile,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::MemoryStore;

/// Job corpus keyed by provider `external_id`
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert or fully replace the posting with the same external id.
    /// Must be atomic per document so overlapping reconciliations never duplicate.
    async fn upsert(&self, posting: &JobPosting) -> Result<UpsertOutcome, DatabaseError>;

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<JobRecord>, DatabaseError>;

    async fn list(&self, filter: &JobFilter) -> Result<Vec<JobRecord>, DatabaseError>;

    /// Up to `limit` jobs for scoring, most recently updated first
    async fn corpus(&self, limit: i64) -> Result<Vec<JobRecord>, DatabaseError>;

    async fn count(&self) -> Result<i64, DatabaseError>;
}

/// Saved-for-later records, unique per `(user_id, external_id)`
#[async_trait]
pub trait SavedJobStore: Send + Sync {
    async fn save(&self, user_id: &str, external_id: &str) -> Result<SaveOutcome, DatabaseError>;

    /// Returns false when nothing was saved under that pair
    async fn remove(&self, user_id: &str, external_id: &str) -> Result<bool, DatabaseError>;

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<SavedForLater>, DatabaseError>;

    async fn list_all(&self) -> Result<Vec<SavedForLater>, DatabaseError>;

    async fn count_for_user(&self, user_id: &str) -> Result<i64, DatabaseError>;

    async fn is_saved(&self, user_id: &str, external_id: &str) -> Result<bool, DatabaseError>;

    async fn mark_reminded(
        &self,
        user_id: &str,
        external_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError>;
}

/// Profile lookups against the authentication collaborator's data
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_profile(&self, user_id: &str) -> Result<Option<UserProfile>, DatabaseError>;
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn create(&self, user_id: &str, external_id: &str)
        -> Result<Application, DatabaseError>;

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Application>, DatabaseError>;
}
