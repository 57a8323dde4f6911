// Ingestion path: listings client → reconciler → job corpus

pub mod normalize;
pub mod reconciler;

pub use normalize::normalize_posting;
pub use reconciler::{JobReconciler, ReconcileReport};

use crate::errors::IngestionError;
use crate::listings::{FetchQuery, ListingsClient};
use crate::telemetry;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Outcome of one fetch-and-reconcile run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestionReport {
    pub pages: u32,
    pub fetched: usize,
    pub upserted: usize,
    pub inserted: usize,
    pub rejected: usize,
}

/// Fetches up to `pages_per_run` pages and reconciles each one as it arrives
#[derive(Clone)]
pub struct IngestionService {
    client: Arc<dyn ListingsClient>,
    reconciler: JobReconciler,
    query: FetchQuery,
    pages_per_run: u32,
}

impl IngestionService {
    pub fn new(
        client: Arc<dyn ListingsClient>,
        reconciler: JobReconciler,
        query: FetchQuery,
        pages_per_run: u32,
    ) -> Self {
        Self {
            client,
            reconciler,
            query,
            pages_per_run: pages_per_run.max(1),
        }
    }

    /// Run with the configured query
    pub async fn run(&self) -> Result<IngestionReport, IngestionError> {
        self.run_with(&self.query).await
    }

    /// Run with an explicit query (manual "fetch now").
    ///
    /// Stops at the first empty page. Provider and store failures end the run;
    /// pages reconciled before the failure stay reconciled.
    #[instrument(skip(self))]
    pub async fn run_with(&self, query: &FetchQuery) -> Result<IngestionReport, IngestionError> {
        let result = self.fetch_pages(query).await;

        match &result {
            Ok(report) => {
                telemetry::record_ingestion_run("success");
                info!(
                    pages = report.pages,
                    fetched = report.fetched,
                    upserted = report.upserted,
                    "Ingestion run complete"
                );
            }
            Err(e) => {
                telemetry::record_ingestion_run("failure");
                error!(error = %e, "Ingestion run failed");
            }
        }

        result
    }

    async fn fetch_pages(&self, query: &FetchQuery) -> Result<IngestionReport, IngestionError> {
        let mut report = IngestionReport::default();

        for page in 1..=self.pages_per_run {
            let postings = self.client.fetch(query, page).await?;
            report.pages = page;

            if postings.is_empty() {
                break;
            }

            report.fetched += postings.len();
            let reconciled = self.reconciler.reconcile(&postings).await?;
            report.upserted += reconciled.upserted;
            report.inserted += reconciled.inserted;
            report.rejected += reconciled.rejected;
        }

        Ok(report)
    }
}
