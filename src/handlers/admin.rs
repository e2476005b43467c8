//! Admin login.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use super::{HandlerFuture, Services};
use crate::http::context::RequestContext;
use crate::http::error::{GatewayError, GatewayResult};

const MAX_LOGIN_BODY: usize = 16 * 1024;

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    message: &'static str,
    role: &'static str,
    token: String,
}

pub fn login(services: Arc<Services>, ctx: RequestContext, req: Request<Body>) -> HandlerFuture {
    Box::pin(async move { login_inner(&services, &ctx, req).await })
}

async fn login_inner(
    services: &Services,
    ctx: &RequestContext,
    req: Request<Body>,
) -> GatewayResult<Response> {
    let bytes = to_bytes(req.into_body(), MAX_LOGIN_BODY)
        .await
        .map_err(|_| GatewayError::BadRequest("Request body too large.".to_string()))?;

    let body: LoginRequest = serde_json::from_slice(&bytes)
        .map_err(|_| GatewayError::BadRequest("Request body must be JSON.".to_string()))?;

    let (username, password) = match (body.username, body.password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
        _ => {
            return Err(GatewayError::BadRequest(
                "Username and password are required.".to_string(),
            ))
        }
    };

    let (expected_user, expected_pass) = match (&services.admin.username, &services.admin.password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
        _ => {
            return Err(GatewayError::Configuration(
                "admin credentials are not configured".to_string(),
            ))
        }
    };

    if username != *expected_user || password != *expected_pass {
        warn!(request_id = %ctx.request_id, client = %ctx.client_key, "Admin login rejected");
        return Err(GatewayError::Unauthorized("invalid credentials".to_string()));
    }

    let mut claims = Map::new();
    claims.insert("sub".to_string(), Value::String(username));
    claims.insert("role".to_string(), json!("admin"));
    let token = services.tokens.issue(services.token_lifetime_days, claims)?;

    info!(request_id = %ctx.request_id, client = %ctx.client_key, "Admin login succeeded");

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            message: "Login successful",
            role: "admin",
            token,
        }),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdminConfig;
    use crate::security::TokenService;
    use std::time::Instant;

    fn services(secret: Option<&str>, admin: Option<(&str, &str)>) -> Arc<Services> {
        Arc::new(Services {
            tokens: Arc::new(TokenService::new(secret.map(str::to_owned))),
            admin: AdminConfig {
                username: admin.map(|(u, _)| u.to_owned()),
                password: admin.map(|(_, p)| p.to_owned()),
            },
            token_lifetime_days: 1,
            route_count: 0,
            started_at: Instant::now(),
        })
    }

    fn ctx() -> RequestContext {
        RequestContext {
            request_id: "test".to_string(),
            client_key: "127.0.0.1".to_string(),
            claims: None,
        }
    }

    fn post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_success_issues_admin_token() {
        let services = services(Some("secret"), Some(("root", "pw")));
        let response = login(services.clone(), ctx(), post(r#"{"username":"root","password":"pw"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["role"], "admin");

        let claims = services.tokens.verify(json["token"].as_str().unwrap()).unwrap();
        assert_eq!(claims.role(), Some("admin"));
        assert_eq!(claims.sub(), Some("root"));
    }

    #[tokio::test]
    async fn test_missing_fields_is_bad_request() {
        let services = services(Some("secret"), Some(("root", "pw")));
        for body in [r#"{"username":"root"}"#, r#"{"password":"pw"}"#, "{}", "not json"] {
            let err = login(services.clone(), ctx(), post(body)).await.unwrap_err();
            assert!(matches!(err, GatewayError::BadRequest(_)), "{body}");
        }
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let services = services(Some("secret"), Some(("root", "pw")));
        let err = login(services, ctx(), post(r#"{"username":"root","password":"nope"}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_unset_credentials_is_configuration_error() {
        let services = services(Some("secret"), None);
        let err = login(services, ctx(), post(r#"{"username":"root","password":"pw"}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_unset_secret_is_configuration_error() {
        let services = services(None, Some(("root", "pw")));
        let err = login(services, ctx(), post(r#"{"username":"root","password":"pw"}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));
    }
}
