// Timing and isolation tests for the pipeline scheduler

use anyhow::Result;
use common::scheduler::{PipelineScheduler, ScheduledTask};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Task that sleeps for `work` and counts starts, completions and in-flight runs
struct SleepyTask {
    name: &'static str,
    work: Duration,
    started: AtomicUsize,
    completed: AtomicUsize,
    in_flight: Arc<AtomicUsize>,
}

impl SleepyTask {
    fn new(name: &'static str, work: Duration) -> Arc<Self> {
        Arc::new(Self {
            name,
            work,
            started: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            in_flight: Arc::new(AtomicUsize::new(0)),
        })
    }
}

struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ScheduledTask for SleepyTask {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(&self) -> Result<usize> {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let _guard = InFlightGuard(self.in_flight.clone());

        tokio::time::sleep(self.work).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(1)
    }
}

struct PanickingTask;

#[async_trait::async_trait]
impl ScheduledTask for PanickingTask {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn run(&self) -> Result<usize> {
        panic!("scheduled run panicked");
    }
}

fn spawn_scheduler(
    scheduler: PipelineScheduler,
) -> (Arc<PipelineScheduler>, tokio::task::JoinHandle<Result<()>>) {
    let scheduler = Arc::new(scheduler);
    let runner = scheduler.clone();
    let handle = tokio::spawn(async move { runner.start().await });
    (scheduler, handle)
}

#[tokio::test(start_paused = true)]
async fn test_slow_run_does_not_block_next_tick() {
    let task = SleepyTask::new("slow", Duration::from_secs(25));
    let (scheduler, handle) = spawn_scheduler(
        PipelineScheduler::new(Duration::from_secs(100))
            .register(task.clone(), Duration::from_secs(10)),
    );

    tokio::time::sleep(Duration::from_secs(45)).await;

    // Ticks at 10, 20, 30 and 40 all started although each run takes 25s
    assert_eq!(task.started.load(Ordering::SeqCst), 4);
    assert!(task.in_flight.load(Ordering::SeqCst) >= 2);

    scheduler.stop();
    handle.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_run_exceeding_timeout_is_cancelled() {
    let task = SleepyTask::new("stuck", Duration::from_secs(600));
    let (scheduler, handle) = spawn_scheduler(
        PipelineScheduler::new(Duration::from_secs(5))
            .register(task.clone(), Duration::from_secs(10)),
    );

    tokio::time::sleep(Duration::from_secs(12)).await;
    assert_eq!(task.in_flight.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(task.in_flight.load(Ordering::SeqCst), 0);
    assert_eq!(task.completed.load(Ordering::SeqCst), 0);

    scheduler.stop();
    handle.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_tasks_run_on_independent_timers() {
    let fetch = SleepyTask::new("fetch", Duration::from_secs(1));
    let scan = SleepyTask::new("scan", Duration::from_secs(1));
    let (scheduler, handle) = spawn_scheduler(
        PipelineScheduler::new(Duration::from_secs(30))
            .register(fetch.clone(), Duration::from_secs(60))
            .register(scan.clone(), Duration::from_secs(3600)),
    );

    tokio::time::sleep(Duration::from_secs(3605)).await;

    assert_eq!(fetch.completed.load(Ordering::SeqCst), 60);
    assert_eq!(scan.completed.load(Ordering::SeqCst), 1);

    scheduler.stop();
    handle.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_panicking_run_is_contained() {
    let healthy = SleepyTask::new("healthy", Duration::from_millis(1));
    let (scheduler, handle) = spawn_scheduler(
        PipelineScheduler::new(Duration::from_secs(5))
            .register(Arc::new(PanickingTask), Duration::from_secs(10))
            .register(healthy.clone(), Duration::from_secs(10)),
    );

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(healthy.completed.load(Ordering::SeqCst), 3);

    scheduler.stop();
    handle.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_stop_ends_start() {
    let task = SleepyTask::new("idle", Duration::from_secs(1));
    let (scheduler, handle) = spawn_scheduler(
        PipelineScheduler::new(Duration::from_secs(5))
            .register(task.clone(), Duration::from_secs(3600)),
    );

    tokio::time::sleep(Duration::from_secs(1)).await;
    scheduler.stop();

    handle.await.unwrap().unwrap();
    assert_eq!(task.started.load(Ordering::SeqCst), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// A fast task fires exactly once per elapsed interval
    #[test]
    fn property_run_count_matches_elapsed_intervals(
        interval_secs in 1u64..120,
        periods in 0u64..20,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();

        let completed = runtime.block_on(async move {
            let task = SleepyTask::new("prop", Duration::from_millis(1));
            let (scheduler, handle) = spawn_scheduler(
                PipelineScheduler::new(Duration::from_secs(60))
                    .register(task.clone(), Duration::from_secs(interval_secs)),
            );

            // Half an interval past the last tick leaves room for the 1ms run
            tokio::time::sleep(Duration::from_millis(interval_secs * 1000 * periods + interval_secs * 500)).await;
            scheduler.stop();
            handle.await.unwrap().unwrap();
            task.completed.load(Ordering::SeqCst)
        });

        prop_assert_eq!(completed as u64, periods);
    }
}
