//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use api_gateway::handlers::{HandlerFuture, Services};
use api_gateway::http::{GatewayError, RequestContext};
use api_gateway::security::TokenService;
use api_gateway::{GatewayConfig, HandlerRegistry, HttpServer};
use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};
use tempfile::TempDir;
use tower::ServiceExt;

pub const SECRET: &str = "integration-secret";

/// A route tree on disk plus the gateway built over it.
pub struct TestGateway {
    pub dir: TempDir,
    pub server: HttpServer,
}

pub fn write_route(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// The routes every pipeline test mounts.
pub fn standard_routes(root: &Path) {
    write_route(root, "admin/login.toml", "handler = \"admin.login\"\nmethods = [\"POST\"]");
    write_route(root, "admin/session.toml", "handler = \"system.whoami\"\nrole = \"admin\"");
    write_route(root, "system/status.toml", "handler = \"system.status\"\nmethods = [\"GET\"]");
    write_route(root, "system/whoami.toml", "handler = \"system.whoami\"\nauth = true");
    write_route(root, "test/fail.toml", "handler = \"test.fail\"");
    write_route(root, "test/panic.toml", "handler = \"test.panic\"");
}

pub fn base_config(root: &Path) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.routes.root = root.to_path_buf();
    config.auth.signing_secret = Some(SECRET.to_string());
    config.admin.username = Some("root".to_string());
    config.admin.password = Some("hunter2".to_string());
    config
}

pub fn registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::builtin();
    registry.register("test.fail", fail);
    registry.register("test.panic", explode);
    registry
}

/// Build a gateway over the standard routes, letting `tweak` adjust config.
pub fn gateway(tweak: impl FnOnce(&mut GatewayConfig)) -> TestGateway {
    let dir = TempDir::new().unwrap();
    standard_routes(dir.path());
    let mut config = base_config(dir.path());
    tweak(&mut config);
    let server = HttpServer::new(config, &registry());
    TestGateway { dir, server }
}

impl TestGateway {
    pub async fn send(&self, req: Request<Body>) -> Response {
        self.server.router().oneshot(req).await.unwrap()
    }
}

pub fn request(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder().method(method).uri(uri)
}

/// Attach a peer address the way `into_make_service_with_connect_info` would.
pub fn from_peer(mut req: Request<Body>, peer: &str) -> Request<Body> {
    let addr: SocketAddr = peer.parse().unwrap();
    req.extensions_mut().insert(ConnectInfo(addr));
    req
}

pub fn get(uri: &str) -> Request<Body> {
    from_peer(request("GET", uri).body(Body::empty()).unwrap(), "10.1.1.1:4000")
}

pub fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    from_peer(
        request("GET", uri)
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap(),
        "10.1.1.1:4000",
    )
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    from_peer(
        request("POST", uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        "10.1.1.1:4000",
    )
}

pub fn token_for_role(role: &str) -> String {
    let claims: Map<String, Value> = json!({ "sub": "tester", "role": role })
        .as_object()
        .cloned()
        .unwrap();
    TokenService::new(Some(SECRET.to_string())).issue(1, claims).unwrap()
}

pub fn expired_token(role: &str) -> String {
    let claims: Map<String, Value> = json!({ "sub": "tester", "role": role })
        .as_object()
        .cloned()
        .unwrap();
    TokenService::new(Some(SECRET.to_string()))
        .issue_at(Utc::now() - Duration::days(3), 1, claims)
        .unwrap()
}

pub async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn fail(_: Arc<Services>, _: RequestContext, _: Request<Body>) -> HandlerFuture {
    Box::pin(async { Err(GatewayError::Internal("database connection refused".to_string())) })
}

fn explode(_: Arc<Services>, _: RequestContext, _: Request<Body>) -> HandlerFuture {
    Box::pin(async {
        if true {
            panic!("handler exploded");
        }
        Ok((StatusCode::OK, "unreachable").into_response())
    })
}
