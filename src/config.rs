//! Engine configuration.
//!
//! Settings come from an optional TOML file overlaid with `DESKFLOW__`
//! environment variables, for example `DESKFLOW__DATABASE__URL` or
//! `DESKFLOW__SCHEDULER__TICK_INTERVAL_SECS`. Every field has a default
//! except the database URL.

use crate::notification::services::DispatcherSettings;
use crate::recurrence::services::SchedulerSettings;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "DESKFLOW";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The sources could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is out of range.
    #[error("invalid configuration value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },
}

/// Top-level engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Database connection.
    pub database: DatabaseConfig,
    /// Lifecycle service tuning.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    /// Recurrence scheduler tuning.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Notification dispatcher tuning.
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
}

/// Database connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum pooled connections.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

/// Lifecycle service settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// How long a transition waits for a row lock.
    pub lock_timeout_ms: u64,
    /// Pause before retrying a transient storage failure.
    pub retry_backoff_ms: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 5_000,
            retry_backoff_ms: 50,
        }
    }
}

impl LifecycleConfig {
    /// Returns the lock timeout.
    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Returns the retry backoff.
    #[must_use]
    pub const fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Recurrence scheduler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between ticks.
    pub tick_interval_secs: u64,
    /// Due definitions handled per tick.
    pub batch_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        let settings = SchedulerSettings::default();
        Self {
            tick_interval_secs: settings.tick_interval.as_secs(),
            batch_size: settings.batch_size,
        }
    }
}

impl SchedulerConfig {
    /// Converts to the scheduler's runtime settings.
    #[must_use]
    pub const fn settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            tick_interval: Duration::from_secs(self.tick_interval_secs),
            batch_size: self.batch_size,
        }
    }
}

/// Notification dispatcher settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Bounded queue capacity.
    pub queue_capacity: usize,
    /// Concurrent delivery workers.
    pub workers: usize,
    /// Pause before the single delivery retry.
    pub retry_delay_ms: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        let settings = DispatcherSettings::default();
        Self {
            queue_capacity: 1_024,
            workers: settings.workers,
            retry_delay_ms: u64::try_from(settings.retry_delay.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl DispatcherConfig {
    /// Converts to the dispatcher's runtime settings.
    #[must_use]
    pub const fn settings(&self) -> DispatcherSettings {
        DispatcherSettings {
            workers: self.workers,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

const fn default_pool_size() -> u32 {
    10
}

impl EngineConfig {
    /// Loads configuration from `path` (optional) and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when a source is malformed or the
    /// database URL is missing, and [`ConfigError::Invalid`] for
    /// out-of-range values.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(environment())
            .build()?;
        let engine: Self = settings.try_deserialize()?;
        engine.validate()?;
        Ok(engine)
    }

    /// Parses configuration from TOML text overlaid with the environment.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .add_source(environment())
            .build()?;
        let engine: Self = settings.try_deserialize()?;
        engine.validate()?;
        Ok(engine)
    }

    /// Checks value ranges that deserialization cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            (
                self.database.url.trim().is_empty(),
                "database.url",
                "must not be empty",
            ),
            (self.database.pool_size == 0, "database.pool_size", "must be positive"),
            (
                self.lifecycle.lock_timeout_ms == 0,
                "lifecycle.lock_timeout_ms",
                "must be positive",
            ),
            (
                self.scheduler.tick_interval_secs == 0,
                "scheduler.tick_interval_secs",
                "must be positive",
            ),
            (self.scheduler.batch_size == 0, "scheduler.batch_size", "must be positive"),
            (
                self.dispatcher.queue_capacity == 0,
                "dispatcher.queue_capacity",
                "must be positive",
            ),
            (self.dispatcher.workers == 0, "dispatcher.workers", "must be positive"),
        ];
        checks
            .into_iter()
            .find(|(failed, _, _)| *failed)
            .map_or(Ok(()), |(_, field, reason)| {
                Err(ConfigError::Invalid { field, reason })
            })
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
}
