// Bootstrap utilities shared by the api and scheduler binaries

use crate::config::Settings;
use crate::db::repositories::{
    application::ApplicationRepository, job::JobRepository, profile::ProfileRepository,
    saved_job::SavedJobRepository,
};
use crate::db::DbPool;
use crate::ingestion::{IngestionService, JobReconciler};
use crate::listings::{FetchQuery, FindworkClient};
use crate::notifications::{notifier_from_config, DeadlineScanner};
use crate::recommend::{RecommendationScorer, RecommendationService};
use crate::store::{ApplicationStore, JobStore, MemoryStore, ProfileStore, SavedJobStore};
use crate::telemetry;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Store handles behind their traits, plus the pool when backed by Postgres
#[derive(Clone)]
pub struct Stores {
    pub jobs: Arc<dyn JobStore>,
    pub saved: Arc<dyn SavedJobStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub applications: Arc<dyn ApplicationStore>,
    pub db_pool: Option<DbPool>,
}

impl Stores {
    pub fn memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            jobs: store.clone(),
            saved: store.clone(),
            profiles: store.clone(),
            applications: store,
            db_pool: None,
        }
    }

    pub fn postgres(db_pool: DbPool) -> Self {
        Self {
            jobs: Arc::new(JobRepository::new(db_pool.clone())),
            saved: Arc::new(SavedJobRepository::new(db_pool.clone())),
            profiles: Arc::new(ProfileRepository::new(db_pool.clone())),
            applications: Arc::new(ApplicationRepository::new(db_pool.clone())),
            db_pool: Some(db_pool),
        }
    }
}

/// Load settings and reject invalid ones before anything starts
pub fn load_settings() -> Result<Settings> {
    let settings = Settings::load().context("Failed to load configuration")?;
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    Ok(settings)
}

/// Structured logging plus the Prometheus exporter (port 0 disables it)
pub fn init_telemetry(settings: &Settings) -> Result<()> {
    telemetry::init_logging(
        &settings.observability.log_level,
        settings.observability.tracing_endpoint.as_deref(),
    )?;

    if settings.observability.metrics_port != 0 {
        telemetry::init_metrics(settings.observability.metrics_port)?;
    }

    Ok(())
}

/// Connect and migrate Postgres, or use the in-memory store for `memory://`
#[tracing::instrument(skip(settings))]
pub async fn init_stores(settings: &Settings) -> Result<Stores> {
    if settings.database.is_memory() {
        info!("Using in-memory store");
        return Ok(Stores::memory());
    }

    info!("Initializing database pool");
    let db_pool = DbPool::new(&settings.database)
        .await
        .context("Failed to initialize database pool")?;
    db_pool
        .migrate()
        .await
        .context("Failed to run database migrations")?;
    info!("Database pool initialized and migrated");

    Ok(Stores::postgres(db_pool))
}

#[tracing::instrument(skip(settings, stores))]
pub fn init_ingestion_service(settings: &Settings, stores: &Stores) -> Result<Arc<IngestionService>> {
    let client = FindworkClient::new(&settings.listings)
        .context("Failed to initialize listings client")?;
    let query = FetchQuery {
        search: settings.listings.search.clone(),
        location: settings.listings.location.clone(),
    };

    info!(
        api_url = %settings.listings.api_url,
        pages_per_run = settings.listings.pages_per_run,
        "Ingestion service initialized"
    );

    Ok(Arc::new(IngestionService::new(
        Arc::new(client),
        JobReconciler::new(stores.jobs.clone()),
        query,
        settings.listings.pages_per_run,
    )))
}

pub fn init_recommendation_service(settings: &Settings, stores: &Stores) -> Arc<RecommendationService> {
    Arc::new(RecommendationService::new(
        stores.jobs.clone(),
        stores.profiles.clone(),
        RecommendationScorer::new(settings.recommend.fallback_policy),
        settings.recommend.corpus_limit,
    ))
}

#[tracing::instrument(skip(settings, stores))]
pub fn init_deadline_scanner(settings: &Settings, stores: &Stores) -> Result<Arc<DeadlineScanner>> {
    let notifier = notifier_from_config(&settings.push).context("Failed to initialize push notifier")?;

    let scanner = DeadlineScanner::new(
        stores.jobs.clone(),
        stores.saved.clone(),
        stores.profiles.clone(),
        notifier,
    )
    .with_cooldown_hours(settings.scheduler.reminder_cooldown_hours);

    info!(
        push_configured = settings.push.server_key.is_some(),
        cooldown_hours = settings.scheduler.reminder_cooldown_hours,
        "Deadline scanner initialized"
    );

    Ok(Arc::new(scanner))
}
