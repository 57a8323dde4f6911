use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::handlers::{api_error, ErrorResponse, SuccessResponse};
use crate::state::AppState;
use common::models::{Application, ApplicationStatus, JobRecord, UserClaims};

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub external_id: String,
}

/// Short job description embedded in application responses
#[derive(Debug, Serialize)]
pub struct JobSummary {
    pub external_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
}

impl JobSummary {
    fn of(external_id: &str, job: Option<&JobRecord>) -> Self {
        match job {
            Some(job) => Self {
                external_id: external_id.to_string(),
                title: job.posting.title.clone(),
                company: job.posting.company_name.clone(),
                location: job.posting.location.clone(),
            },
            None => Self {
                external_id: external_id.to_string(),
                title: UNKNOWN.to_string(),
                company: UNKNOWN.to_string(),
                location: UNKNOWN.to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApplicationView {
    pub id: String,
    pub external_id: String,
    pub user_id: String,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub job: JobSummary,
}

impl ApplicationView {
    fn new(application: Application, job: Option<&JobRecord>) -> Self {
        let job = JobSummary::of(&application.external_id, job);
        Self {
            id: application.id,
            external_id: application.external_id,
            user_id: application.user_id,
            status: application.status,
            applied_at: application.applied_at,
            job,
        }
    }
}

/// Record an application for a stored job
#[tracing::instrument(skip(state, claims, req), fields(user_id = %claims.sub, external_id = %req.external_id))]
pub async fn create_application(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Json(req): Json<CreateApplicationRequest>,
) -> Result<SuccessResponse<ApplicationView>, ErrorResponse> {
    let job = state
        .stores
        .jobs
        .find_by_external_id(&req.external_id)
        .await
        .map_err(api_error)?
        .ok_or_else(|| ErrorResponse::not_found(format!("Job {} not found", req.external_id)))?;

    let application = state
        .stores
        .applications
        .create(&claims.sub, &req.external_id)
        .await
        .map_err(api_error)?;

    tracing::info!(application_id = %application.id, "Application created");
    Ok(SuccessResponse::new(ApplicationView::new(application, Some(&job))))
}

/// The caller's applications with a summary of each job
#[tracing::instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn list_applications(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
) -> Result<SuccessResponse<Vec<ApplicationView>>, ErrorResponse> {
    let applications = state
        .stores
        .applications
        .list_for_user(&claims.sub)
        .await
        .map_err(api_error)?;

    let mut views = Vec::with_capacity(applications.len());
    for application in applications {
        let job = state
            .stores
            .jobs
            .find_by_external_id(&application.external_id)
            .await
            .map_err(api_error)?;
        views.push(ApplicationView::new(application, job.as_ref()));
    }

    Ok(SuccessResponse::new(views))
}
