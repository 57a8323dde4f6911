// Scheduler engine: independent fixed-interval timers, one per registered task

use crate::telemetry;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio::time::{interval_at, timeout, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn, Instrument};

/// A unit of periodic work driven by the scheduler
#[async_trait]
pub trait ScheduledTask: Send + Sync {
    fn name(&self) -> &str;

    /// Run once. The returned count is logged only.
    async fn run(&self) -> Result<usize>;
}

struct Registration {
    task: Arc<dyn ScheduledTask>,
    every: Duration,
}

/// Owns the timers for every registered task.
///
/// Each tick spawns its run as a separate tokio task bounded by `run_timeout`, so
/// a slow or failing run never delays the next tick or takes down the scheduler.
/// `start` returns only after every spawned run has finished or timed out.
pub struct PipelineScheduler {
    registrations: Vec<Registration>,
    run_timeout: Duration,
    shutdown_tx: broadcast::Sender<()>,
}

impl PipelineScheduler {
    pub fn new(run_timeout: Duration) -> Self {
        let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);

        Self {
            registrations: Vec::new(),
            run_timeout,
            shutdown_tx,
        }
    }

    /// Register `task` to run every `every`, first firing one period after start
    pub fn register(mut self, task: Arc<dyn ScheduledTask>, every: Duration) -> Self {
        self.registrations.push(Registration { task, every });
        self
    }

    pub fn task_count(&self) -> usize {
        self.registrations.len()
    }

    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Run the timer loops until `stop` is called, then drain in-flight runs
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<()> {
        info!(tasks = self.registrations.len(), "Starting pipeline scheduler");

        let mut loops = JoinSet::new();
        for registration in &self.registrations {
            let task = registration.task.clone();
            let every = registration.every;
            let run_timeout = self.run_timeout;
            let shutdown_rx = self.shutdown_receiver();
            let span = tracing::info_span!("timer", task = %task.name());

            loops.spawn(timer_loop(task, every, run_timeout, shutdown_rx).instrument(span));
        }

        while let Some(joined) = loops.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Timer loop terminated abnormally");
            }
        }

        info!("Pipeline scheduler stopped");
        Ok(())
    }

    /// Signal every timer loop to exit. Runs already in flight finish or time out.
    #[instrument(skip(self))]
    pub fn stop(&self) {
        info!("Stopping pipeline scheduler");
        let _ = self.shutdown_tx.send(());
    }
}

async fn timer_loop(
    task: Arc<dyn ScheduledTask>,
    every: Duration,
    run_timeout: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut ticker = interval_at(tokio::time::Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut runs = JoinSet::new();

    info!(interval_seconds = every.as_secs(), "Task registered");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let task = task.clone();
                runs.spawn(run_once(task, run_timeout).in_current_span());
            }
            Some(joined) = runs.join_next(), if !runs.is_empty() => {
                log_run_join(joined);
            }
            _ = shutdown_rx.recv() => {
                debug!("Shutdown signal received, timer loop exiting");
                break;
            }
        }
    }

    if !runs.is_empty() {
        info!(in_flight = runs.len(), "Waiting for in-flight runs");
    }
    while let Some(joined) = runs.join_next().await {
        log_run_join(joined);
    }
}

fn log_run_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "Scheduled run terminated abnormally");
    }
}

/// Execute one run of `task` with a timeout, logging the outcome
pub async fn run_once(task: Arc<dyn ScheduledTask>, run_timeout: Duration) {
    let started = Instant::now();

    match timeout(run_timeout, task.run()).await {
        Ok(Ok(count)) => {
            info!(task = task.name(), count = count, "Scheduled run complete");
        }
        Ok(Err(e)) => {
            error!(task = task.name(), error = %e, "Scheduled run failed");
        }
        Err(_) => {
            warn!(
                task = task.name(),
                timeout_seconds = run_timeout.as_secs(),
                "Scheduled run timed out"
            );
        }
    }

    telemetry::record_task_duration(task.name(), started.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTask {
        runs: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ScheduledTask for CountingTask {
        fn name(&self) -> &str {
            "counting"
        }

        async fn run(&self) -> Result<usize> {
            let n = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                anyhow::bail!("run {} failed", n);
            }
            Ok(n)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_fires_once_per_interval() {
        let task = Arc::new(CountingTask {
            runs: AtomicUsize::new(0),
            fail: false,
        });
        let scheduler = Arc::new(
            PipelineScheduler::new(Duration::from_secs(30))
                .register(task.clone(), Duration::from_secs(60)),
        );

        let runner = scheduler.clone();
        let handle = tokio::spawn(async move { runner.start().await });

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(task.runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(62)).await;
        assert_eq!(task.runs.load(Ordering::SeqCst), 2);

        scheduler.stop();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_run_does_not_stop_timer() {
        let task = Arc::new(CountingTask {
            runs: AtomicUsize::new(0),
            fail: true,
        });
        let scheduler = Arc::new(
            PipelineScheduler::new(Duration::from_secs(30))
                .register(task.clone(), Duration::from_secs(10)),
        );

        let runner = scheduler.clone();
        let handle = tokio::spawn(async move { runner.start().await });

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(task.runs.load(Ordering::SeqCst), 3);

        scheduler.stop();
        handle.await.unwrap().unwrap();
    }

    struct SlowTask {
        completed: AtomicUsize,
    }

    #[async_trait]
    impl ScheduledTask for SlowTask {
        fn name(&self) -> &str {
            "slow"
        }

        async fn run(&self) -> Result<usize> {
            tokio::time::sleep(Duration::from_secs(100)).await;
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_waits_for_in_flight_runs() {
        let task = Arc::new(SlowTask {
            completed: AtomicUsize::new(0),
        });
        let scheduler = Arc::new(
            PipelineScheduler::new(Duration::from_secs(300))
                .register(task.clone(), Duration::from_secs(10)),
        );

        let runner = scheduler.clone();
        let handle = tokio::spawn(async move { runner.start().await });

        tokio::time::sleep(Duration::from_secs(11)).await;
        scheduler.stop();
        handle.await.unwrap().unwrap();

        assert_eq!(task.completed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_does_not_outlast_run_timeout() {
        let task = Arc::new(SlowTask {
            completed: AtomicUsize::new(0),
        });
        let scheduler = Arc::new(
            PipelineScheduler::new(Duration::from_secs(20))
                .register(task.clone(), Duration::from_secs(10)),
        );

        let runner = scheduler.clone();
        let handle = tokio::spawn(async move { runner.start().await });

        tokio::time::sleep(Duration::from_secs(11)).await;
        let stopped_at = tokio::time::Instant::now();
        scheduler.stop();
        handle.await.unwrap().unwrap();

        assert_eq!(task.completed.load(Ordering::SeqCst), 0);
        assert!(stopped_at.elapsed() <= Duration::from_secs(20));
    }

    #[test]
    fn test_register_counts_tasks() {
        let task = Arc::new(CountingTask {
            runs: AtomicUsize::new(0),
            fail: false,
        });
        let scheduler = PipelineScheduler::new(Duration::from_secs(1))
            .register(task.clone(), Duration::from_secs(60))
            .register(task, Duration::from_secs(3600));
        assert_eq!(scheduler.task_count(), 2);
    }
}
