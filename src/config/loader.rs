//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: optional TOML file, then process environment overrides,
/// then validation.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_file(path)?,
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML file without applying overrides or validation.
pub fn parse_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply environment-style overrides using `lookup` to read variables.
///
/// Setting both `RATE_LIMIT_WINDOW_SECS` and `RATE_LIMIT_MAX_REQUESTS`
/// switches the limiter on.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(secret) = lookup("ACCESS_CODE").filter(|s| !s.is_empty()) {
        config.auth.signing_secret = Some(secret);
    }
    if let Some(days) = lookup("TOKEN_LIFETIME_DAYS") {
        config.auth.token_lifetime_days = parse_var("TOKEN_LIFETIME_DAYS", days)?;
    }
    if let Some(username) = lookup("ADMIN_USERNAME") {
        config.admin.username = Some(username);
    }
    if let Some(password) = lookup("ADMIN_PASSWORD") {
        config.admin.password = Some(password);
    }
    if let Some(dir) = lookup("API_DIR") {
        config.routes.root = PathBuf::from(dir);
    }
    if let Some(port) = lookup("SERVER_PORT") {
        let port: u16 = parse_var("SERVER_PORT", port)?;
        config.listener.bind_address = format!("0.0.0.0:{}", port);
    }

    let window = lookup("RATE_LIMIT_WINDOW_SECS");
    let max = lookup("RATE_LIMIT_MAX_REQUESTS");
    if let (Some(window), Some(max)) = (window, max) {
        config.rate_limit.window_secs = parse_var("RATE_LIMIT_WINDOW_SECS", window)?;
        config.rate_limit.max_requests = parse_var("RATE_LIMIT_MAX_REQUESTS", max)?;
        config.rate_limit.enabled = true;
    }
    if let Some(message) = lookup("RATE_LIMIT_MESSAGE") {
        config.rate_limit.message = message;
    }
    if let Some(status) = lookup("RATE_LIMIT_STATUS_CODE") {
        config.rate_limit.status_code = parse_var("RATE_LIMIT_STATUS_CODE", status)?;
    }

    Ok(())
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}
