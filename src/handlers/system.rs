use std::sync::Arc;

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::{HandlerFuture, Services};
use crate::http::context::RequestContext;
use crate::http::error::{GatewayError, GatewayResult};
use crate::security::Claims;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub routes: usize,
}

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub request_id: String,
    pub claims: Claims,
}

pub fn status(services: Arc<Services>, _ctx: RequestContext, _req: Request<Body>) -> HandlerFuture {
    Box::pin(async move {
        Ok(Json(SystemStatus {
            version: env!("CARGO_PKG_VERSION"),
            status: "operational",
            uptime_secs: services.started_at.elapsed().as_secs(),
            routes: services.route_count,
        })
        .into_response())
    })
}

pub fn whoami(_services: Arc<Services>, ctx: RequestContext, _req: Request<Body>) -> HandlerFuture {
    Box::pin(async move { whoami_inner(ctx) })
}

fn whoami_inner(ctx: RequestContext) -> GatewayResult<Response> {
    // No claims means the manifest forgot `auth = true`.
    let claims = ctx
        .claims
        .ok_or_else(|| GatewayError::Internal("whoami reached without verified claims".to_string()))?;

    Ok(Json(WhoAmI {
        request_id: ctx.request_id,
        claims,
    })
    .into_response())
}
