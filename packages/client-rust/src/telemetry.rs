//! Structured logging setup for applications embedding the client.
//!
//! The library itself only emits `tracing` events and spans; installing a
//! subscriber is left to the host. [`init`] is a convenience for hosts that
//! have none of their own.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::subscriber::SetGlobalDefaultError;
use tracing::Subscriber;
use tracing_subscriber::{fmt, EnvFilter};

static TELEMETRY: OnceCell<()> = OnceCell::new();

/// Filter used when neither the config nor `RUST_LOG` names one.
pub const DEFAULT_FILTER: &str = "relaycall_client=info,relaycall_core=info";

/// Log output settings.
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    /// `EnvFilter` directives. `None` reads `RUST_LOG`, then falls back to
    /// [`DEFAULT_FILTER`].
    pub filter: Option<String>,
    /// Emit one JSON object per event instead of human-readable lines.
    pub json: bool,
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    Filter(String),
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global subscriber on first call; later calls are no-ops.
///
/// # Errors
///
/// Returns [`TelemetryError`] if the filter does not parse or another
/// subscriber is already installed globally.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    TELEMETRY.get_or_try_init(|| install(config)).map(|_| ())
}

fn filter_for(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    let directives = match &config.filter {
        Some(filter) => filter.clone(),
        None => std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| DEFAULT_FILTER.to_string()),
    };
    EnvFilter::try_new(&directives).map_err(|error| TelemetryError::Filter(error.to_string()))
}

fn install(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = filter_for(config)?;
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal());

    let subscriber: Box<dyn Subscriber + Send + Sync> = if config.json {
        Box::new(builder.json().flatten_event(true).finish())
    } else {
        Box::new(builder.compact().finish())
    };
    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let config = TelemetryConfig {
            filter: Some("relaycall_client=debug".to_string()),
            json: true,
        };
        init(&config).unwrap();
        init(&config).unwrap();
        init(&TelemetryConfig::default()).unwrap();
    }

    #[test]
    fn invalid_filter_is_rejected() {
        let config = TelemetryConfig {
            filter: Some("relaycall_client=notalevel".to_string()),
            json: false,
        };
        let err = filter_for(&config).unwrap_err();
        assert!(matches!(err, TelemetryError::Filter(_)), "{err}");
    }

    #[test]
    fn explicit_filter_wins() {
        let config = TelemetryConfig {
            filter: Some("warn".to_string()),
            json: false,
        };
        assert_eq!(filter_for(&config).unwrap().to_string(), "warn");
    }
}
