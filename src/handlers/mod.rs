//! Business handlers and the registry route manifests resolve against.
//!
//! # Design Decisions
//! - Handlers are plain functions registered by name at startup; a route
//!   manifest names the handler it mounts
//! - Handlers receive an immutable [`RequestContext`] and shared [`Services`]
//! - Handlers return [`GatewayResult`]; the pipeline turns errors into responses

pub mod admin;
pub mod system;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{body::Body, http::Request, response::Response};
use futures_util::future::BoxFuture;

use crate::config::{AdminConfig, GatewayConfig};
use crate::http::context::RequestContext;
use crate::http::error::GatewayResult;
use crate::security::TokenService;

pub type HandlerFuture = BoxFuture<'static, GatewayResult<Response>>;

/// Signature every registered handler implements.
pub type HandlerFn = fn(Arc<Services>, RequestContext, Request<Body>) -> HandlerFuture;

/// Collaborators shared by all handlers.
#[derive(Debug)]
pub struct Services {
    pub tokens: Arc<TokenService>,
    pub admin: AdminConfig,
    pub token_lifetime_days: u32,
    pub route_count: usize,
    pub started_at: Instant,
}

impl Services {
    pub fn from_config(config: &GatewayConfig, tokens: Arc<TokenService>, route_count: usize) -> Self {
        Self {
            tokens,
            admin: config.admin.clone(),
            token_lifetime_days: config.auth.token_lifetime_days,
            route_count,
            started_at: Instant::now(),
        }
    }
}

/// Name → handler table.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, HandlerFn>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every handler this crate ships.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("admin.login", admin::login);
        registry.register("system.status", system::status);
        registry.register("system.whoami", system::whoami);
        registry
    }

    /// Register `handler` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, handler: HandlerFn) -> &mut Self {
        self.handlers.insert(name.into(), handler);
        self
    }

    pub fn get(&self, name: &str) -> Option<HandlerFn> {
        self.handlers.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
