//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// Route discovery settings.
    pub routes: RoutesConfig,

    /// Token signing settings.
    pub auth: AuthConfig,

    /// Admin credential pair used by the login handler.
    pub admin: AdminConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Role name to rank. Higher rank = more trusted.
    pub roles: RolesConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

// Secrets print as their presence only.
fn redacted(secret: &Option<String>) -> &'static str {
    if secret.is_some() {
        "<redacted>"
    } else {
        "<unset>"
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("signing_secret", &redacted(&self.signing_secret))
            .field("token_lifetime_days", &self.token_lifetime_days)
            .finish()
    }
}

impl fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConfig")
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .finish()
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Where route manifests live and where they are mounted.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Root directory scanned for route manifests.
    pub root: PathBuf,

    /// Namespace every derived path is mounted under.
    pub prefix: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("api"),
            prefix: "/api".to_string(),
        }
    }
}

/// Token signing configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC signing secret. Absence only fails the operations that need it.
    pub signing_secret: Option<String>,

    /// Lifetime of tokens issued by the login handler, in days.
    pub token_lifetime_days: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_secret: None,
            token_lifetime_days: 1,
        }
    }
}

/// Admin credential pair.
#[derive(Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting. The limiter is inert until this is set.
    pub enabled: bool,

    /// Counting window length in seconds.
    pub window_secs: u64,

    /// Maximum requests per client within one window.
    pub max_requests: u32,

    /// Body of the rejection response.
    pub message: String,

    /// Status code of the rejection response.
    pub status_code: u16,

    /// How often expired buckets are swept, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            window_secs: 60,
            max_requests: 100,
            message: "Too many requests, please try again later.".to_string(),
            status_code: 429,
            sweep_interval_secs: 60,
        }
    }
}

/// Role hierarchy as configured.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RolesConfig(pub BTreeMap<String, u32>);

impl Default for RolesConfig {
    fn default() -> Self {
        Self(BTreeMap::from([
            ("visitor".to_string(), 1),
            ("user".to_string(), 2),
            ("admin".to_string(), 3),
        ]))
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) used when RUST_LOG is unset.
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
