// Scheduler module: periodic ingestion and deadline scanning

pub mod engine;
pub mod tasks;

pub use engine::{run_once, PipelineScheduler, ScheduledTask};
pub use tasks::{DeadlineScanTask, IngestionTask};
