//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (window > 0, status code usable)
//! - Check the role hierarchy is a strict total order
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - A missing signing secret is not an error here; it fails at first use

use std::collections::{HashMap, HashSet};

use axum::http::StatusCode;
use thiserror::Error;

use crate::config::schema::GatewayConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("rate_limit.window_secs must be greater than zero")]
    ZeroWindow,

    #[error("rate_limit.max_requests must be greater than zero")]
    ZeroMaxRequests,

    #[error("rate_limit.status_code {0} is not a valid HTTP status")]
    InvalidStatusCode(u16),

    #[error("rate_limit.sweep_interval_secs must be greater than zero")]
    ZeroSweepInterval,

    #[error("routes.prefix must start with '/' and not end with it: {0:?}")]
    InvalidPrefix(String),

    #[error("roles must not be empty")]
    NoRoles,

    #[error("roles {first:?} and {second:?} share rank {rank}")]
    DuplicateRank { first: String, second: String, rank: u32 },

    #[error("role {0:?} is declared more than once (names are case-insensitive)")]
    DuplicateRole(String),

    #[error("auth.token_lifetime_days must be greater than zero")]
    ZeroTokenLifetime,

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let limit = &config.rate_limit;
    if limit.enabled {
        if limit.window_secs == 0 {
            errors.push(ValidationError::ZeroWindow);
        }
        if limit.max_requests == 0 {
            errors.push(ValidationError::ZeroMaxRequests);
        }
        if limit.sweep_interval_secs == 0 {
            errors.push(ValidationError::ZeroSweepInterval);
        }
    }
    if StatusCode::from_u16(limit.status_code).is_err() || limit.status_code < 400 {
        errors.push(ValidationError::InvalidStatusCode(limit.status_code));
    }

    let prefix = &config.routes.prefix;
    if !prefix.starts_with('/') || (prefix.len() > 1 && prefix.ends_with('/')) {
        errors.push(ValidationError::InvalidPrefix(prefix.clone()));
    }

    if config.auth.token_lifetime_days == 0 {
        errors.push(ValidationError::ZeroTokenLifetime);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    validate_roles(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_roles(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    let roles = &config.roles.0;
    if roles.is_empty() {
        errors.push(ValidationError::NoRoles);
        return;
    }

    let mut names = HashSet::new();
    let mut ranks: HashMap<u32, &str> = HashMap::new();
    for (name, rank) in roles {
        if !names.insert(name.to_lowercase()) {
            errors.push(ValidationError::DuplicateRole(name.clone()));
        }
        if let Some(first) = ranks.insert(*rank, name) {
            errors.push(ValidationError::DuplicateRank {
                first: first.to_string(),
                second: name.clone(),
                rank: *rank,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = GatewayConfig::default();
        config.rate_limit.enabled = true;
        config.rate_limit.window_secs = 0;
        config.rate_limit.max_requests = 0;
        config.routes.prefix = "api".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::ZeroWindow));
        assert!(errors.contains(&ValidationError::ZeroMaxRequests));
        assert!(errors.contains(&ValidationError::InvalidPrefix("api".to_string())));
    }

    #[test]
    fn test_zero_window_ignored_while_disabled() {
        let mut config = GatewayConfig::default();
        config.rate_limit.window_secs = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_rejects_non_error_status() {
        let mut config = GatewayConfig::default();
        config.rate_limit.status_code = 200;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::InvalidStatusCode(200)]);
    }

    #[test]
    fn test_rejects_shared_rank_and_case_duplicates() {
        let mut config = GatewayConfig::default();
        config.roles.0.insert("Admin".to_string(), 9);
        config.roles.0.insert("editor".to_string(), 2);

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DuplicateRole(_))));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::DuplicateRank { rank: 2, .. })));
    }
}
