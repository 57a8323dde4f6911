// Deadline reminders and push delivery

pub mod deadline;
pub mod fcm;

pub use deadline::{in_reminder_window, DeadlineScanner, ScanReport};
pub use fcm::FcmNotifier;

use crate::config::PushConfig;
use crate::errors::NotificationError;
use crate::models::NotificationEvent;
use async_trait::async_trait;
use std::sync::Arc;

/// Best-effort push delivery.
///
/// The returned flag is an acknowledgement for logging only; delivery failures
/// never propagate to the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushNotifier: Send + Sync {
    async fn send(&self, token: &str, event: &NotificationEvent) -> bool;
}

/// Notifier used when no push credentials are configured
pub struct LogNotifier;

#[async_trait]
impl PushNotifier for LogNotifier {
    #[tracing::instrument(skip_all)]
    async fn send(&self, _token: &str, event: &NotificationEvent) -> bool {
        tracing::info!(
            user_id = %event.user_id,
            external_id = %event.external_id,
            title = %event.title,
            body = %event.body,
            "Push delivery not configured, reminder logged"
        );
        true
    }
}

/// Pick the FCM notifier when a server key is configured, the log notifier otherwise
pub fn notifier_from_config(config: &PushConfig) -> Result<Arc<dyn PushNotifier>, NotificationError> {
    match config.server_key.as_deref().filter(|k| !k.is_empty()) {
        Some(key) => Ok(Arc::new(FcmNotifier::new(
            &config.endpoint,
            key,
            config.timeout_seconds,
        )?)),
        None => Ok(Arc::new(LogNotifier)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_notifier_acknowledges() {
        let event = NotificationEvent {
            user_id: "u1".to_string(),
            external_id: "1".to_string(),
            title: "Apply Reminder".to_string(),
            body: "Deadline".to_string(),
        };
        assert!(LogNotifier.send("token", &event).await);
    }

    #[test]
    fn test_notifier_from_config_without_key() {
        let config = PushConfig::default();
        assert!(notifier_from_config(&config).is_ok());
    }

    #[test]
    fn test_notifier_from_config_with_key() {
        let config = PushConfig {
            server_key: Some("server-key".to_string()),
            ..PushConfig::default()
        };
        assert!(notifier_from_config(&config).is_ok());
    }
}
