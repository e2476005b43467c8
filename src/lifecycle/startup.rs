//! Startup orchestration.
//!
//! # Responsibilities
//! - Load `.env`, configuration file and environment overrides
//! - Initialize logging and metrics
//! - Bind the listener last, once routes are loaded
//!
//! # Design Decisions
//! - Fail fast: configuration errors are fatal
//! - A missing signing secret is not a startup error

use std::path::Path;

use crate::config::{load_config, ConfigError, GatewayConfig};
use crate::observability::{logging, metrics};

/// Load configuration and bring up logging and metrics.
pub fn prepare(config_path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let dotenv_path = dotenv::dotenv().ok();

    let config = load_config(config_path)?;
    init_observability(&config);

    if let Some(path) = dotenv_path {
        tracing::info!(path = %path.display(), "Loaded .env file");
    }
    Ok(config)
}

fn init_observability(config: &GatewayConfig) {
    logging::init_logging(&config.observability.log_level);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes_root = %config.routes.root.display(),
        rate_limit = config.rate_limit.enabled,
        signing_secret = config.auth.signing_secret.is_some(),
        "Configuration loaded"
    );
}
