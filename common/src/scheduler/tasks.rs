// The two periodic pipeline tasks

use super::ScheduledTask;
use crate::ingestion::IngestionService;
use crate::notifications::DeadlineScanner;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Fetch from the listings provider and reconcile into the job corpus
pub struct IngestionTask {
    service: Arc<IngestionService>,
}

impl IngestionTask {
    pub fn new(service: Arc<IngestionService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ScheduledTask for IngestionTask {
    fn name(&self) -> &str {
        "ingestion"
    }

    async fn run(&self) -> Result<usize> {
        let report = self.service.run().await?;
        Ok(report.upserted)
    }
}

/// Scan saved jobs and send deadline reminders
pub struct DeadlineScanTask {
    scanner: Arc<DeadlineScanner>,
}

impl DeadlineScanTask {
    pub fn new(scanner: Arc<DeadlineScanner>) -> Self {
        Self { scanner }
    }
}

#[async_trait]
impl ScheduledTask for DeadlineScanTask {
    fn name(&self) -> &str {
        "deadline_scan"
    }

    async fn run(&self) -> Result<usize> {
        let report = self.scanner.scan_and_notify().await?;
        Ok(report.notified)
    }
}
