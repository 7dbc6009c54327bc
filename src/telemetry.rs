//! Tracing subscriber initialization
//!
//! Installs a global `tracing` subscriber with an [`EnvFilter`] and a fmt
//! layer. `RUST_LOG` overrides the configured level.

use crate::config::LoggingConfig;
use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Errors that can occur during subscriber initialization
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(#[from] ParseError),

    #[error("Failed to set global subscriber (may already be initialized): {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(&config.level)?),
    }
}

/// Initialize the global subscriber from logging configuration
///
/// # Errors
///
/// Fails if the configured level is not a valid filter directive or a global
/// subscriber is already installed.
pub fn init_subscriber(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let filter = env_filter(config)?;

    if config.json {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()?;
    }

    tracing::debug!(level = %config.level, json = config.json, "Logging initialized");
    Ok(())
}
