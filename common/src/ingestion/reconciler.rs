// Job store reconciler: merges fetched postings into the corpus by external id

use super::normalize::normalize_posting;
use crate::errors::DatabaseError;
use crate::models::UpsertOutcome;
use crate::store::JobStore;
use crate::telemetry;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Counts for one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub upserted: usize,
    pub inserted: usize,
    pub updated: usize,
    pub rejected: usize,
}

/// Upserts raw postings without ever deleting stale ones.
///
/// Safe to run concurrently with itself: the store's per-document upsert is the
/// only coordination.
#[derive(Clone)]
pub struct JobReconciler {
    store: Arc<dyn JobStore>,
}

impl JobReconciler {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    /// Reconcile a batch of raw postings.
    ///
    /// Records that cannot be normalized are skipped. A store failure aborts the
    /// batch and is returned to the caller.
    #[instrument(skip(self, raw_postings), fields(batch_size = raw_postings.len()))]
    pub async fn reconcile(
        &self,
        raw_postings: &[serde_json::Value],
    ) -> Result<ReconcileReport, DatabaseError> {
        let mut report = ReconcileReport::default();

        for raw in raw_postings {
            let posting = match normalize_posting(raw) {
                Ok(posting) => posting,
                Err(e) => {
                    warn!(error = %e, "Skipping malformed posting");
                    report.rejected += 1;
                    continue;
                }
            };

            match self.store.upsert(&posting).await? {
                UpsertOutcome::Inserted => report.inserted += 1,
                UpsertOutcome::Updated => report.updated += 1,
            }
            report.upserted += 1;
            debug!(external_id = %posting.external_id, "Posting upserted");
        }

        telemetry::record_postings_reconciled(report.upserted, report.rejected);
        info!(
            upserted = report.upserted,
            inserted = report.inserted,
            updated = report.updated,
            rejected = report.rejected,
            "Reconciliation complete"
        );

        Ok(report)
    }
}
