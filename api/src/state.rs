use std::sync::Arc;

use common::auth::JwtService;
use common::bootstrap::Stores;
use common::config::Settings;
use common::ingestion::IngestionService;
use common::recommend::RecommendationService;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub ingestion: Arc<IngestionService>,
    pub recommender: Arc<RecommendationService>,
    pub jwt: JwtService,
    pub config: Arc<Settings>,
}

impl AppState {
    pub fn new(
        stores: Stores,
        ingestion: Arc<IngestionService>,
        recommender: Arc<RecommendationService>,
        jwt: JwtService,
        config: Settings,
    ) -> Self {
        Self {
            stores,
            ingestion,
            recommender,
            jwt,
            config: Arc::new(config),
        }
    }
}
