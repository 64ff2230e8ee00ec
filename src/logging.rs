//! Logging subscriber setup
//!
//! A registry with an `EnvFilter` and one fmt layer, JSON or human-readable.
//!
//! ```text
//! Registry
//!   ├── EnvFilter (RUST_LOG, else CLI level, else config level)
//!   └── Fmt Layer (json | pretty)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use resource_uploadr::config::LoggingConfig;
//! use resource_uploadr::logging::init_subscriber;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! init_subscriber(&LoggingConfig::default(), Some("debug"))?;
//! # Ok(())
//! # }
//! ```

use crate::config::LoggingConfig;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

/// Errors that can occur during subscriber initialization
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter '{0}'")]
    InvalidFilter(String),

    #[error("Failed to set global subscriber (may already be initialized): {0}")]
    AlreadyInitialized(String),
}

/// Build the level filter. RUST_LOG takes precedence over both arguments.
pub fn build_filter(config: &LoggingConfig, level_override: Option<&str>) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let level = level_override.unwrap_or(config.level.as_str());
    EnvFilter::try_new(level).map_err(|_| LoggingError::InvalidFilter(level.to_string()))
}

/// Install the global subscriber
pub fn init_subscriber(config: &LoggingConfig, level_override: Option<&str>) -> Result<(), LoggingError> {
    let env_filter = build_filter(config, level_override)?;

    if config.format == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true);

        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer);

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true);

        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer);

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;
    }

    Ok(())
}
