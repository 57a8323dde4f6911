// Firebase Cloud Messaging (legacy HTTP) notifier

use super::PushNotifier;
use crate::errors::NotificationError;
use crate::models::NotificationEvent;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub struct FcmNotifier {
    client: Client,
    endpoint: String,
    server_key: String,
}

impl FcmNotifier {
    pub fn new(
        endpoint: &str,
        server_key: &str,
        timeout_seconds: u64,
    ) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| {
                NotificationError::Transport(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            server_key: server_key.to_string(),
        })
    }

    async fn deliver(&self, token: &str, event: &NotificationEvent) -> Result<(), NotificationError> {
        let payload = json!({
            "to": token,
            "notification": {
                "title": event.title,
                "body": event.body,
            },
            "data": {
                "external_id": event.external_id,
            },
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("key={}", self.server_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotificationError::Status(response.status().as_u16()));
        }

        Ok(())
    }
}

#[async_trait]
impl PushNotifier for FcmNotifier {
    #[instrument(skip(self, token, event), fields(user_id = %event.user_id, external_id = %event.external_id))]
    async fn send(&self, token: &str, event: &NotificationEvent) -> bool {
        match self.deliver(token, event).await {
            Ok(()) => {
                debug!("Push notification accepted");
                true
            }
            Err(e) => {
                warn!(error = %e, "Push notification failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn event() -> NotificationEvent {
        NotificationEvent {
            user_id: "u1".to_string(),
            external_id: "42".to_string(),
            title: "Apply Reminder".to_string(),
            body: "Deadline for Engineer at Acme is approaching.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_posts_notification_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/fcm/send"))
            .and(header("Authorization", "key=secret"))
            .and(body_partial_json(json!({
                "to": "device-token",
                "notification": {"title": "Apply Reminder"},
                "data": {"external_id": "42"}
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier =
            FcmNotifier::new(&format!("{}/fcm/send", server.uri()), "secret", 5).unwrap();
        assert!(notifier.send("device-token", &event()).await);
    }

    #[tokio::test]
    async fn test_send_reports_failure_without_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier =
            FcmNotifier::new(&format!("{}/fcm/send", server.uri()), "secret", 5).unwrap();
        assert!(!notifier.send("device-token", &event()).await);
    }
}
