use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::handlers::{api_error, ErrorResponse, SuccessResponse};
use crate::state::AppState;
use common::ingestion::IngestionReport;
use common::listings::FetchQuery;
use common::models::{JobFilter, JobRecord, UserClaims};

/// Query string for listing jobs
#[derive(Debug, Default, Deserialize)]
pub struct ListJobsQuery {
    /// Title keyword
    pub q: Option<String>,
    pub location: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<ListJobsQuery> for JobFilter {
    fn from(query: ListJobsQuery) -> Self {
        JobFilter {
            keyword: query.q,
            location: query.location,
            limit: query.limit,
            offset: query.offset,
        }
    }
}

/// List stored jobs, filtered by title keyword and location
#[tracing::instrument(skip(state))]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> Result<SuccessResponse<Vec<JobRecord>>, ErrorResponse> {
    let filter = JobFilter::from(query);
    let jobs = state.stores.jobs.list(&filter).await.map_err(api_error)?;

    Ok(SuccessResponse::new(jobs))
}

/// Get one job by its provider id
#[tracing::instrument(skip(state))]
pub async fn get_job(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
) -> Result<SuccessResponse<JobRecord>, ErrorResponse> {
    let job = state
        .stores
        .jobs
        .find_by_external_id(&external_id)
        .await
        .map_err(api_error)?
        .ok_or_else(|| ErrorResponse::not_found(format!("Job {} not found", external_id)))?;

    Ok(SuccessResponse::new(job))
}

/// Run the ingestion path now; an optional body overrides the configured filters
#[tracing::instrument(skip(state, claims, body), fields(user_id = %claims.sub))]
pub async fn fetch_jobs(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    body: Option<Json<FetchQuery>>,
) -> Result<SuccessResponse<IngestionReport>, ErrorResponse> {
    let report = match body {
        Some(Json(query)) => state.ingestion.run_with(&query).await,
        None => state.ingestion.run().await,
    }
    .map_err(api_error)?;

    tracing::info!(upserted = report.upserted, "Manual fetch complete");
    Ok(SuccessResponse::new(report))
}
