//! Per-request guard pipeline.
//!
//! ```text
//! RateCheck ──▶ AuthCheck ──▶ RoleCheck ──▶ Dispatch
//!    │ 429*        │ 401          │ 403        │ 500 on Err/panic
//!    ▼             ▼              ▼            ▼
//!                  exactly one response
//! ```
//! `*` status and message come from the limiter's policy.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Request, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::FutureExt;
use tracing::{debug, error, warn};

use crate::handlers::Services;
use crate::http::context::RequestContext;
use crate::http::error::GatewayError;
use crate::observability::metrics;
use crate::routing::RouteEntry;
use crate::security::{Authorizer, RateLimiter, TokenService};

/// Guards shared by every route.
#[derive(Debug, Clone)]
pub struct RequestPipeline {
    limiter: Arc<RateLimiter>,
    tokens: Arc<TokenService>,
    authorizer: Arc<dyn Authorizer>,
    services: Arc<Services>,
}

impl RequestPipeline {
    pub fn new(
        limiter: Arc<RateLimiter>,
        tokens: Arc<TokenService>,
        authorizer: Arc<dyn Authorizer>,
        services: Arc<Services>,
    ) -> Self {
        Self {
            limiter,
            tokens,
            authorizer,
            services,
        }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Run every stage for `route` and produce the single response.
    pub async fn handle(&self, route: &RouteEntry, req: Request<Body>) -> Response {
        let start = Instant::now();
        let method = req.method().to_string();
        let ctx = RequestContext::from_request(&req);

        let guarded = self.guard(route, ctx, &req);
        let response = match guarded {
            Ok(ctx) => self.dispatch(route, ctx, req).await,
            Err((stage, err)) => {
                metrics::record_rejection(stage);
                err.into_response()
            }
        };

        metrics::record_request(&route.path, &method, response.status().as_u16(), start);
        response
    }

    /// RateCheck, AuthCheck and RoleCheck. Synchronous: nothing here awaits.
    fn guard(
        &self,
        route: &RouteEntry,
        ctx: RequestContext,
        req: &Request<Body>,
    ) -> Result<RequestContext, (&'static str, GatewayError)> {
        if !self.limiter.allow(&ctx.client_key) {
            warn!(request_id = %ctx.request_id, client = %ctx.client_key, path = %route.path, "Rate limit exceeded");
            let (status, message) = self
                .limiter
                .policy()
                .map(|p| (p.status, p.message.clone()))
                .unwrap_or((StatusCode::TOO_MANY_REQUESTS, String::new()));
            return Err(("rate_limit", GatewayError::RateLimited { status, message }));
        }

        if !route.requires_auth {
            return Ok(ctx);
        }

        let token = bearer_token(req).ok_or_else(|| {
            debug!(request_id = %ctx.request_id, path = %route.path, "Missing bearer token");
            ("auth", GatewayError::Unauthorized("missing bearer token".to_string()))
        })?;

        let claims = self.tokens.verify(token).map_err(|e| {
            warn!(request_id = %ctx.request_id, client = %ctx.client_key, error = %e, "Token verification failed");
            ("auth", GatewayError::from(e))
        })?;

        let ctx = ctx.with_claims(claims);

        if let Some(required) = &route.required_role {
            let role = ctx.role().unwrap_or_default();
            if !self.authorizer.satisfies(role, required) {
                warn!(
                    request_id = %ctx.request_id,
                    role = %role,
                    required = %required,
                    path = %route.path,
                    "Insufficient role"
                );
                return Err(("role", GatewayError::Forbidden(format!("{role:?} below {required:?}"))));
            }
        }

        Ok(ctx)
    }

    async fn dispatch(&self, route: &RouteEntry, ctx: RequestContext, req: Request<Body>) -> Response {
        let request_id = ctx.request_id.clone();
        let fut = (route.handler)(self.services.clone(), ctx, req);

        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                if err.status().is_server_error() {
                    error!(request_id = %request_id, handler = %route.handler_name, error = %err, "Handler failed");
                }
                err.into_response()
            }
            Err(panic) => {
                let detail = panic_message(panic.as_ref());
                error!(request_id = %request_id, handler = %route.handler_name, panic = %detail, "Handler panicked");
                GatewayError::Internal(detail).into_response()
            }
        }
    }
}

/// Token from `Authorization: Bearer <token>`, scheme matched case-insensitively.
fn bearer_token(req: &Request<Body>) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_string())
}
