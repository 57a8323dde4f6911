// Configuration management with layered configuration (file, env)

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub listings: ListingsConfig,
    #[serde(default)]
    pub push: PushConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub recommend: RecommendConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres URL, or `memory://` for the in-process store
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_seconds: u64,
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url.starts_with("memory://")
    }
}

/// External listings provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingsConfig {
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_pages_per_run")]
    pub pages_per_run: u32,
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_pages_per_run() -> u32 {
    1
}

/// Push delivery settings. Without a server key reminders are only logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    pub endpoint: String,
    #[serde(default)]
    pub server_key: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://fcm.googleapis.com/fcm/send".to_string(),
            server_key: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_jwt_algorithm")]
    pub jwt_algorithm: String,
    #[serde(default = "default_expiration_minutes")]
    pub expiration_minutes: u64,
}

fn default_jwt_algorithm() -> String {
    "HS256".to_string()
}

fn default_expiration_minutes() -> u64 {
    1440
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub fetch_interval_minutes: u64,
    pub deadline_scan_interval_minutes: u64,
    pub run_timeout_seconds: u64,
    /// 0 disables the per-record reminder cool-down
    pub reminder_cooldown_hours: u64,
}

impl SchedulerConfig {
    pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;
    pub const MAX_RUN_TIMEOUT_SECONDS: u64 = 24 * 60 * 60;
    pub const MAX_REMINDER_COOLDOWN_HOURS: u64 = 365 * 24;

    pub fn fetch_interval(&self) -> Duration {
        Duration::from_secs(self.fetch_interval_minutes.saturating_mul(60))
    }

    pub fn deadline_scan_interval(&self) -> Duration {
        Duration::from_secs(self.deadline_scan_interval_minutes.saturating_mul(60))
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_seconds)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            fetch_interval_minutes: 60,
            deadline_scan_interval_minutes: 60,
            run_timeout_seconds: 300,
            reminder_cooldown_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendConfig {
    pub default_limit: usize,
    pub corpus_limit: i64,
    pub fallback_policy: FallbackPolicy,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            default_limit: 6,
            corpus_limit: 100,
            fallback_policy: FallbackPolicy::Recency,
        }
    }
}

/// How jobs without a skill match are scored and sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    Recency,
    Random,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub metrics_port: u16,
    pub tracing_endpoint: Option<String>,
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local configuration (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }

        if self.database.url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }

        if self.listings.api_url.is_empty() {
            return Err("Listings api_url cannot be empty".to_string());
        }
        if self.listings.pages_per_run == 0 {
            return Err("Listings pages_per_run must be greater than 0".to_string());
        }

        if self.auth.jwt_secret.is_empty() {
            return Err("JWT secret cannot be empty".to_string());
        }

        let scheduler = &self.scheduler;
        for (name, minutes) in [
            ("fetch_interval_minutes", scheduler.fetch_interval_minutes),
            (
                "deadline_scan_interval_minutes",
                scheduler.deadline_scan_interval_minutes,
            ),
        ] {
            if minutes == 0 || minutes > SchedulerConfig::MAX_INTERVAL_MINUTES {
                return Err(format!(
                    "Scheduler {} must be between 1 and {}",
                    name,
                    SchedulerConfig::MAX_INTERVAL_MINUTES
                ));
            }
        }
        if scheduler.run_timeout_seconds == 0
            || scheduler.run_timeout_seconds > SchedulerConfig::MAX_RUN_TIMEOUT_SECONDS
        {
            return Err(format!(
                "Scheduler run_timeout_seconds must be between 1 and {}",
                SchedulerConfig::MAX_RUN_TIMEOUT_SECONDS
            ));
        }
        if scheduler.reminder_cooldown_hours > SchedulerConfig::MAX_REMINDER_COOLDOWN_HOURS {
            return Err(format!(
                "Scheduler reminder_cooldown_hours must be at most {}",
                SchedulerConfig::MAX_REMINDER_COOLDOWN_HOURS
            ));
        }

        if self.recommend.default_limit == 0 {
            return Err("Recommend default_limit must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/workscope".to_string(),
                max_connections: 10,
                min_connections: 2,
                connect_timeout_seconds: 30,
            },
            listings: ListingsConfig {
                api_url: "https://findwork.dev/api/jobs/".to_string(),
                api_key: String::new(),
                timeout_seconds: 30,
                search: None,
                location: None,
                pages_per_run: 1,
            },
            push: PushConfig::default(),
            auth: AuthConfig {
                jwt_secret: "change-me-in-production".to_string(),
                jwt_algorithm: default_jwt_algorithm(),
                expiration_minutes: default_expiration_minutes(),
            },
            scheduler: SchedulerConfig::default(),
            recommend: RecommendConfig::default(),
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                metrics_port: 9090,
                tracing_endpoint: None,
            },
        }
    }
}
