// Common library shared by the scheduler and API binaries

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod errors;
pub mod ingestion;
pub mod listings;
pub mod models;
pub mod notifications;
pub mod recommend;
pub mod scheduler;
pub mod store;
pub mod telemetry;
