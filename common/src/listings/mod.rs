// External listings provider client

pub mod findwork;

use crate::errors::ListingsError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use findwork::FindworkClient;

/// Optional search filters passed through to the provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchQuery {
    pub search: Option<String>,
    pub location: Option<String>,
}

/// ListingsClient fetches one page of raw postings from a provider.
///
/// A non-success response or transport error fails the call; retries are left to
/// the caller's schedule. Zero results is an empty vector, not an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingsClient: Send + Sync {
    async fn fetch(
        &self,
        query: &FetchQuery,
        page: u32,
    ) -> Result<Vec<serde_json::Value>, ListingsError>;
}
