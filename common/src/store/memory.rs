// In-process store with the same semantics as the Postgres repositories.
// Backs `database.url = "memory://"` and the test suites.

use super::{ApplicationStore, JobStore, ProfileStore, SavedJobStore};
use crate::errors::DatabaseError;
use crate::models::{
    Application, ApplicationStatus, JobFilter, JobPosting, JobRecord, SaveOutcome, SavedForLater,
    SavedStatus, UpsertOutcome, UserProfile,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Collections {
    jobs: HashMap<String, JobRecord>,
    saved: Vec<SavedForLater>,
    applications: Vec<Application>,
    profiles: HashMap<String, UserProfile>,
}

/// Mutex-guarded collections. Every operation holds the lock for its whole
/// duration, which makes each upsert atomic.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Collections>,
    next_id: AtomicU64,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a user profile
    pub fn put_profile(&self, profile: UserProfile) -> Result<(), DatabaseError> {
        self.lock()?.profiles.insert(profile.id.clone(), profile);
        Ok(())
    }

    /// Simulate an unreachable store: every later call fails with `ConnectionFailed`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, DatabaseError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DatabaseError::ConnectionFailed(
                "memory store marked unavailable".to_string(),
            ));
        }
        self.inner
            .lock()
            .map_err(|e| DatabaseError::QueryFailed(format!("memory store poisoned: {}", e)))
    }

    fn next_handle(&self) -> String {
        (self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn upsert(&self, posting: &JobPosting) -> Result<UpsertOutcome, DatabaseError> {
        let now = Utc::now();
        let mut inner = self.lock()?;

        if let Some(existing) = inner.jobs.get_mut(&posting.external_id) {
            existing.posting = posting.clone();
            existing.updated_at = now;
            return Ok(UpsertOutcome::Updated);
        }

        let record = JobRecord {
            id: self.next_handle(),
            posting: posting.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.jobs.insert(posting.external_id.clone(), record);
        Ok(UpsertOutcome::Inserted)
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<JobRecord>, DatabaseError> {
        Ok(self.lock()?.jobs.get(external_id).cloned())
    }

    async fn list(&self, filter: &JobFilter) -> Result<Vec<JobRecord>, DatabaseError> {
        let inner = self.lock()?;
        let mut jobs: Vec<JobRecord> = inner
            .jobs
            .values()
            .filter(|job| filter.matches(&job.posting))
            .cloned()
            .collect();
        jobs.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.external_id().cmp(b.external_id()))
        });

        Ok(jobs
            .into_iter()
            .skip(filter.effective_offset() as usize)
            .take(filter.effective_limit() as usize)
            .collect())
    }

    async fn corpus(&self, limit: i64) -> Result<Vec<JobRecord>, DatabaseError> {
        let inner = self.lock()?;
        let mut jobs: Vec<JobRecord> = inner.jobs.values().cloned().collect();
        jobs.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.external_id().cmp(b.external_id()))
        });
        jobs.truncate(limit.max(0) as usize);
        Ok(jobs)
    }

    async fn count(&self) -> Result<i64, DatabaseError> {
        Ok(self.lock()?.jobs.len() as i64)
    }
}

#[async_trait]
impl SavedJobStore for MemoryStore {
    async fn save(&self, user_id: &str, external_id: &str) -> Result<SaveOutcome, DatabaseError> {
        let mut inner = self.lock()?;
        if inner
            .saved
            .iter()
            .any(|s| s.user_id == user_id && s.external_id == external_id)
        {
            return Ok(SaveOutcome::AlreadyExists);
        }

        inner.saved.push(SavedForLater {
            id: self.next_handle(),
            user_id: user_id.to_string(),
            external_id: external_id.to_string(),
            saved_at: Utc::now(),
            status: SavedStatus::Pending,
            last_reminded_at: None,
        });
        Ok(SaveOutcome::Saved)
    }

    async fn remove(&self, user_id: &str, external_id: &str) -> Result<bool, DatabaseError> {
        let mut inner = self.lock()?;
        let before = inner.saved.len();
        inner
            .saved
            .retain(|s| !(s.user_id == user_id && s.external_id == external_id));
        Ok(inner.saved.len() < before)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<SavedForLater>, DatabaseError> {
        Ok(self
            .lock()?
            .saved
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<SavedForLater>, DatabaseError> {
        Ok(self.lock()?.saved.clone())
    }

    async fn count_for_user(&self, user_id: &str) -> Result<i64, DatabaseError> {
        Ok(self
            .lock()?
            .saved
            .iter()
            .filter(|s| s.user_id == user_id)
            .count() as i64)
    }

    async fn is_saved(&self, user_id: &str, external_id: &str) -> Result<bool, DatabaseError> {
        Ok(self
            .lock()?
            .saved
            .iter()
            .any(|s| s.user_id == user_id && s.external_id == external_id))
    }

    async fn mark_reminded(
        &self,
        user_id: &str,
        external_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let mut inner = self.lock()?;
        if let Some(saved) = inner
            .saved
            .iter_mut()
            .find(|s| s.user_id == user_id && s.external_id == external_id)
        {
            saved.last_reminded_at = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn find_profile(&self, user_id: &str) -> Result<Option<UserProfile>, DatabaseError> {
        Ok(self.lock()?.profiles.get(user_id).cloned())
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn create(
        &self,
        user_id: &str,
        external_id: &str,
    ) -> Result<Application, DatabaseError> {
        let application = Application {
            id: self.next_handle(),
            user_id: user_id.to_string(),
            external_id: external_id.to_string(),
            status: ApplicationStatus::Pending,
            applied_at: Utc::now(),
        };
        self.lock()?.applications.push(application.clone());
        Ok(application)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Application>, DatabaseError> {
        Ok(self
            .lock()?
            .applications
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }
}
