use axum::{
    extract::{Query, State},
    Extension,
};
use serde::Deserialize;

use crate::handlers::SuccessResponse;
use crate::state::AppState;
use common::models::{ScoredJob, UserClaims};

const MAX_LIMIT: usize = 50;

#[derive(Debug, Default, Deserialize)]
pub struct RecommendQuery {
    pub limit: Option<usize>,
}

/// Recommendations for the calling user. Never fails; degrades to fallback picks.
#[tracing::instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn recommended_jobs(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Query(query): Query<RecommendQuery>,
) -> SuccessResponse<Vec<ScoredJob>> {
    let limit = query
        .limit
        .unwrap_or(state.config.recommend.default_limit)
        .clamp(1, MAX_LIMIT);

    SuccessResponse::new(state.recommender.recommend_for_user(&claims.sub, limit).await)
}
