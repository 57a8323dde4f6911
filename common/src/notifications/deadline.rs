// Deadline scanner: joins saved jobs to their postings and sends reminders
// for deadlines falling today or tomorrow (UTC).

use super::PushNotifier;
use crate::config::SchedulerConfig;
use crate::errors::DatabaseError;
use crate::models::{JobRecord, NotificationEvent, SavedForLater, UserProfile};
use crate::store::{JobStore, ProfileStore, SavedJobStore};
use crate::telemetry;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Deadline is today or tomorrow
pub fn in_reminder_window(deadline: NaiveDate, today: NaiveDate) -> bool {
    deadline == today || today.succ_opt() == Some(deadline)
}

/// Per-run counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub examined: usize,
    pub due: usize,
    /// Reminders handed to the notifier
    pub notified: usize,
    /// Reminders the notifier acknowledged
    pub delivered: usize,
    pub skipped_missing_job: usize,
    pub skipped_no_deadline: usize,
    pub skipped_malformed_deadline: usize,
    pub skipped_no_token: usize,
    pub skipped_cooldown: usize,
}

pub struct DeadlineScanner {
    jobs: Arc<dyn JobStore>,
    saved: Arc<dyn SavedJobStore>,
    profiles: Arc<dyn ProfileStore>,
    notifier: Arc<dyn PushNotifier>,
    cooldown: Option<Duration>,
}

impl DeadlineScanner {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        saved: Arc<dyn SavedJobStore>,
        profiles: Arc<dyn ProfileStore>,
        notifier: Arc<dyn PushNotifier>,
    ) -> Self {
        Self {
            jobs,
            saved,
            profiles,
            notifier,
            cooldown: None,
        }
    }

    /// Skip records reminded less than `hours` ago. 0 disables the cool-down.
    /// Values above one year are capped at one year.
    pub fn with_cooldown_hours(mut self, hours: u64) -> Self {
        let hours = hours.min(SchedulerConfig::MAX_REMINDER_COOLDOWN_HOURS) as i64;
        self.cooldown = (hours > 0).then(|| Duration::hours(hours));
        self
    }

    pub async fn scan_and_notify(&self) -> Result<ScanReport, DatabaseError> {
        self.scan_and_notify_at(Utc::now()).await
    }

    /// Scan every saved record against the reminder window anchored at `now`.
    ///
    /// Bad or dangling records are skipped one by one. A store failure aborts the run.
    #[instrument(skip(self))]
    pub async fn scan_and_notify_at(&self, now: DateTime<Utc>) -> Result<ScanReport, DatabaseError> {
        let today = now.date_naive();
        let saved = self.saved.list_all().await?;

        let mut report = ScanReport {
            examined: saved.len(),
            ..Default::default()
        };
        let mut jobs: HashMap<String, Option<JobRecord>> = HashMap::new();
        let mut profiles: HashMap<String, Option<UserProfile>> = HashMap::new();

        for item in &saved {
            if !jobs.contains_key(&item.external_id) {
                let job = self.jobs.find_by_external_id(&item.external_id).await?;
                jobs.insert(item.external_id.clone(), job);
            }
            let Some(job) = jobs.get(&item.external_id).and_then(Option::as_ref) else {
                debug!(external_id = %item.external_id, "Saved job no longer exists, skipping");
                report.skipped_missing_job += 1;
                continue;
            };

            let Some(deadline) = job.posting.application_deadline.as_ref() else {
                report.skipped_no_deadline += 1;
                continue;
            };

            let deadline = match deadline.to_date() {
                Ok(date) => date,
                Err(e) => {
                    warn!(external_id = %item.external_id, error = %e, "Malformed deadline, skipping");
                    report.skipped_malformed_deadline += 1;
                    continue;
                }
            };

            if !in_reminder_window(deadline, today) {
                continue;
            }
            report.due += 1;

            if self.in_cooldown(item, now) {
                report.skipped_cooldown += 1;
                continue;
            }

            if !profiles.contains_key(&item.user_id) {
                let profile = self.profiles.find_profile(&item.user_id).await?;
                profiles.insert(item.user_id.clone(), profile);
            }
            let token = profiles
                .get(&item.user_id)
                .and_then(Option::as_ref)
                .and_then(|p| p.push_token.as_deref());
            let Some(token) = token else {
                debug!(user_id = %item.user_id, "No push token for user, skipping");
                report.skipped_no_token += 1;
                continue;
            };

            let event = NotificationEvent::deadline_reminder(&item.user_id, &job.posting);
            let acknowledged = self.notifier.send(token, &event).await;
            report.notified += 1;
            if acknowledged {
                report.delivered += 1;
            }
            telemetry::record_reminder(if acknowledged { "delivered" } else { "failed" });

            if self.cooldown.is_some() {
                if let Err(e) = self
                    .saved
                    .mark_reminded(&item.user_id, &item.external_id, now)
                    .await
                {
                    warn!(error = %e, external_id = %item.external_id, "Failed to record reminder");
                }
            }
        }

        info!(
            examined = report.examined,
            due = report.due,
            notified = report.notified,
            delivered = report.delivered,
            "Deadline scan complete"
        );

        Ok(report)
    }

    fn in_cooldown(&self, item: &SavedForLater, now: DateTime<Utc>) -> bool {
        match (self.cooldown, item.last_reminded_at) {
            (Some(cooldown), Some(last)) => now - last < cooldown,
            _ => false,
        }
    }
}
