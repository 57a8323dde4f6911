// HTTP surface for the job corpus, recommendations, saved jobs and applications

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
