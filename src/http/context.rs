//! Per-request context handed to handlers.

use std::net::SocketAddr;

use axum::{body::Body, extract::ConnectInfo, http::Request};
use uuid::Uuid;

use crate::security::Claims;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Identity and bookkeeping gathered by the pipeline before dispatch.
///
/// Built once per request and never mutated; each stage that learns something
/// produces a new value.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub client_key: String,
    pub claims: Option<Claims>,
}

impl RequestContext {
    /// Read the request ID and client key from a request.
    ///
    /// The client key is the peer IP, or `unknown` when the server was not
    /// started with connect info.
    pub fn from_request(req: &Request<Body>) -> Self {
        let request_id = req
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let client_key = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            request_id,
            client_key,
            claims: None,
        }
    }

    pub fn with_claims(self, claims: Claims) -> Self {
        Self {
            claims: Some(claims),
            ..self
        }
    }

    pub fn role(&self) -> Option<&str> {
        self.claims.as_ref().and_then(Claims::role)
    }
}
