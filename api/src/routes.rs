use axum::{
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::auth_middleware;
use crate::state::AppState;

/// Create the main application router with all routes and middleware
#[tracing::instrument(skip(state))]
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/jobs", get(handlers::jobs::list_jobs))
        .route("/api/jobs/:external_id", get(handlers::jobs::get_job));

    // Protected routes (bearer JWT required)
    let protected_routes = Router::new()
        .route("/api/jobs/fetch", post(handlers::jobs::fetch_jobs))
        .route(
            "/api/jobs/recommended-jobs",
            get(handlers::recommend::recommended_jobs),
        )
        // Apply-later endpoints
        .route(
            "/api/apply/add/:external_id",
            post(handlers::saved::add_saved_job),
        )
        .route(
            "/api/apply/remove/:external_id",
            delete(handlers::saved::remove_saved_job),
        )
        .route("/api/apply/list", get(handlers::saved::list_saved_jobs))
        .route("/api/apply/count", get(handlers::saved::count_saved_jobs))
        .route(
            "/api/apply/check/:external_id",
            get(handlers::saved::check_saved_job),
        )
        // Applications
        .route(
            "/api/applications",
            post(handlers::applications::create_application)
                .get(handlers::applications::list_applications),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
