// Findwork-compatible listings client

use super::{FetchQuery, ListingsClient};
use crate::config::ListingsConfig;
use crate::errors::ListingsError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Paginated response envelope returned by the provider
#[derive(Debug, Deserialize)]
struct ListingsPage {
    #[serde(default)]
    count: Option<u64>,
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

/// HTTP client for the listings API. Sends `Authorization: Token <key>`.
pub struct FindworkClient {
    client: Client,
    api_url: String,
    api_key: String,
    timeout_seconds: u64,
}

impl FindworkClient {
    /// Create a new client with the configured timeout
    pub fn new(config: &ListingsConfig) -> Result<Self, ListingsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ListingsError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            timeout_seconds: config.timeout_seconds,
        })
    }

    fn query_params(query: &FetchQuery, page: u32) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", page.to_string())];
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        if let Some(location) = query.location.as_deref().filter(|l| !l.is_empty()) {
            params.push(("location", location.to_string()));
        }
        params
    }
}

#[async_trait]
impl ListingsClient for FindworkClient {
    #[instrument(skip(self), fields(url = %self.api_url))]
    async fn fetch(
        &self,
        query: &FetchQuery,
        page: u32,
    ) -> Result<Vec<serde_json::Value>, ListingsError> {
        let response = self
            .client
            .get(&self.api_url)
            .header("Authorization", format!("Token {}", self.api_key))
            .query(&Self::query_params(query, page))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ListingsError::Timeout(self.timeout_seconds)
                } else {
                    ListingsError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(500).collect();
            warn!(status = status.as_u16(), body = %body, "Listings provider rejected request");
            return Err(ListingsError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let page_body: ListingsPage = response
            .json()
            .await
            .map_err(|e| ListingsError::Decode(e.to_string()))?;

        debug!(
            page = page,
            reported_count = ?page_body.count,
            results = page_body.results.len(),
            "Fetched listings page"
        );

        Ok(page_body.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, timeout_seconds: u64) -> FindworkClient {
        FindworkClient::new(&ListingsConfig {
            api_url: format!("{}/api/jobs/", server.uri()),
            api_key: "k".to_string(),
            timeout_seconds,
            search: None,
            location: None,
            pages_per_run: 1,
        })
        .unwrap()
    }

    fn rust_query() -> FetchQuery {
        FetchQuery {
            search: Some("rust".to_string()),
            location: Some("remote".to_string()),
        }
    }

    #[tokio::test]
    async fn test_fetch_sends_token_and_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/jobs/"))
            .and(header("Authorization", "Token k"))
            .and(query_param("page", "1"))
            .and(query_param("search", "rust"))
            .and(query_param("location", "remote"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 2,
                "results": [{"id": 1, "role": "Rust Engineer"}, {"id": 2}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let results = client_for(&server, 5).fetch(&rust_query(), 1).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["role"], "Rust Engineer");
    }

    #[tokio::test]
    async fn test_fetch_empty_page_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("page", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .mount(&server)
            .await;

        let results = client_for(&server, 5)
            .fetch(&FetchQuery::default(), 3)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server, 5)
            .fetch(&rust_query(), 2)
            .await
            .unwrap_err();
        match err {
            ListingsError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_undecodable_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server, 5)
            .fetch(&FetchQuery::default(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ListingsError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"results": []}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let err = client_for(&server, 1)
            .fetch(&FetchQuery::default(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ListingsError::Timeout(1)));
    }

    #[test]
    fn test_query_params_skip_empty_filters() {
        let query = FetchQuery {
            search: Some(String::new()),
            location: Some("Berlin".to_string()),
        };
        let params = FindworkClient::query_params(&query, 2);
        assert_eq!(
            params,
            vec![("page", "2".to_string()), ("location", "Berlin".to_string())]
        );
    }

    #[test]
    fn test_client_builds_from_config() {
        let config = ListingsConfig {
            api_url: "http://localhost/api/jobs/".to_string(),
            api_key: "key".to_string(),
            timeout_seconds: 5,
            search: None,
            location: None,
            pages_per_run: 1,
        };
        assert!(FindworkClient::new(&config).is_ok());
    }
}
