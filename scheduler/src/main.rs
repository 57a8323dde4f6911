// Scheduler binary: periodic ingestion and deadline reminders

use anyhow::Result;
use common::bootstrap;
use common::scheduler::{DeadlineScanTask, IngestionTask, PipelineScheduler};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = bootstrap::load_settings()?;
    bootstrap::init_telemetry(&settings)?;

    info!("Starting Workscope scheduler");

    let stores = bootstrap::init_stores(&settings).await.map_err(|e| {
        error!(error = %e, "Failed to initialize stores");
        e
    })?;

    let ingestion = bootstrap::init_ingestion_service(&settings, &stores)?;
    let scanner = bootstrap::init_deadline_scanner(&settings, &stores)?;

    let scheduler = Arc::new(
        PipelineScheduler::new(settings.scheduler.run_timeout())
            .register(
                Arc::new(IngestionTask::new(ingestion)),
                settings.scheduler.fetch_interval(),
            )
            .register(
                Arc::new(DeadlineScanTask::new(scanner)),
                settings.scheduler.deadline_scan_interval(),
            ),
    );

    info!(
        fetch_interval_minutes = settings.scheduler.fetch_interval_minutes,
        deadline_scan_interval_minutes = settings.scheduler.deadline_scan_interval_minutes,
        run_timeout_seconds = settings.scheduler.run_timeout_seconds,
        "Scheduler configured"
    );

    let scheduler_for_shutdown = scheduler.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        scheduler_for_shutdown.stop();
    });

    if let Err(e) = scheduler.start().await {
        error!(error = %e, "Scheduler error");
        return Err(e);
    }

    if let Some(pool) = stores.db_pool {
        pool.close().await;
    }
    common::telemetry::shutdown_tracer();

    info!("Scheduler stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C signal"),
        _ = terminate => info!("Received SIGTERM signal"),
    }
}
