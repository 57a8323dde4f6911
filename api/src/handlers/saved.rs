// Apply-later (saved jobs) endpoints

use axum::{
    extract::{Path, State},
    Extension,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::handlers::{api_error, ErrorResponse, SuccessResponse};
use crate::state::AppState;
use common::models::{JobRecord, SaveOutcome, UserClaims};

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SavedJobView {
    #[serde(flatten)]
    pub job: JobRecord,
    pub is_saved: bool,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SavedJobList {
    pub jobs: Vec<SavedJobView>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct SavedCheck {
    pub is_saved: bool,
}

/// Save a job for later. Saving twice answers `exists`.
#[tracing::instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn add_saved_job(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Path(external_id): Path<String>,
) -> Result<SuccessResponse<StatusResponse>, ErrorResponse> {
    state
        .stores
        .jobs
        .find_by_external_id(&external_id)
        .await
        .map_err(api_error)?
        .ok_or_else(|| ErrorResponse::not_found(format!("Job {} not found", external_id)))?;

    let outcome = state
        .stores
        .saved
        .save(&claims.sub, &external_id)
        .await
        .map_err(api_error)?;

    let status = match outcome {
        SaveOutcome::Saved => "saved",
        SaveOutcome::AlreadyExists => "exists",
    };
    Ok(SuccessResponse::new(StatusResponse { status }))
}

#[tracing::instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn remove_saved_job(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Path(external_id): Path<String>,
) -> Result<SuccessResponse<StatusResponse>, ErrorResponse> {
    let removed = state
        .stores
        .saved
        .remove(&claims.sub, &external_id)
        .await
        .map_err(api_error)?;

    let status = if removed { "removed" } else { "not_found" };
    Ok(SuccessResponse::new(StatusResponse { status }))
}

/// Saved jobs joined to their postings; records whose job is gone are left out
#[tracing::instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn list_saved_jobs(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
) -> Result<SuccessResponse<SavedJobList>, ErrorResponse> {
    let saved = state
        .stores
        .saved
        .list_for_user(&claims.sub)
        .await
        .map_err(api_error)?;

    let mut jobs = Vec::with_capacity(saved.len());
    for item in saved {
        match state
            .stores
            .jobs
            .find_by_external_id(&item.external_id)
            .await
            .map_err(api_error)?
        {
            Some(job) => jobs.push(SavedJobView {
                job,
                is_saved: true,
                saved_at: item.saved_at,
            }),
            None => {
                tracing::debug!(external_id = %item.external_id, "Saved job no longer in corpus");
            }
        }
    }

    let count = jobs.len();
    Ok(SuccessResponse::new(SavedJobList { jobs, count }))
}

#[tracing::instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn count_saved_jobs(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
) -> Result<SuccessResponse<CountResponse>, ErrorResponse> {
    let count = state
        .stores
        .saved
        .count_for_user(&claims.sub)
        .await
        .map_err(api_error)?;

    Ok(SuccessResponse::new(CountResponse { count }))
}

#[tracing::instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn check_saved_job(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Path(external_id): Path<String>,
) -> Result<SuccessResponse<SavedCheck>, ErrorResponse> {
    let is_saved = state
        .stores
        .saved
        .is_saved(&claims.sub, &external_id)
        .await
        .map_err(api_error)?;

    Ok(SuccessResponse::new(SavedCheck { is_saved }))
}
