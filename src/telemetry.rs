//! Structured logging setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::{RelayError, Result};

/// Builds the filter: `RUST_LOG` wins over the configured directives.
pub fn env_filter(cfg: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&cfg.filter)
            .map_err(|err| RelayError::Config(format!("invalid log filter `{}`: {err}", cfg.filter))),
    }
}

/// Installs the global subscriber. Fails if one is already set.
pub fn init_tracing(cfg: &LoggingConfig) -> Result<()> {
    let filter = env_filter(cfg)?;
    let registry = tracing_subscriber::registry().with(filter);
    let installed = if cfg.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };
    installed.map_err(|err| RelayError::Config(format!("failed to install tracing subscriber: {err}")))
}
