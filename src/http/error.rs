//! Error types for request handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::security::TokenError;

/// Every way a request can end other than success.
///
/// Server-side variants carry detail for the log only; the caller sees a
/// generic message.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing or malformed request fields (400).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing, invalid or expired token, or wrong credentials (401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Role below the route's requirement (403).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Rate limit exceeded, with the configured status and message.
    #[error("Rate limited: {message}")]
    RateLimited { status: StatusCode, message: String },

    /// Secret or credentials absent (500).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Handler failure (500).
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GatewayError::Forbidden(_) => StatusCode::FORBIDDEN,
            GatewayError::RateLimited { status, .. } => *status,
            GatewayError::Configuration(_) | GatewayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::BadRequest(_) => "bad_request",
            GatewayError::Unauthorized(_) => "unauthorized",
            GatewayError::Forbidden(_) => "forbidden",
            GatewayError::RateLimited { .. } => "rate_limited",
            GatewayError::Configuration(_) => "configuration",
            GatewayError::Internal(_) => "internal",
        }
    }
}

impl From<TokenError> for GatewayError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Configuration => GatewayError::Configuration(err.to_string()),
            TokenError::Authentication(reason) => GatewayError::Unauthorized(reason),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            GatewayError::BadRequest(msg) => msg.as_str(),
            GatewayError::Unauthorized(_) => "Unauthorized",
            GatewayError::Forbidden(_) => "Forbidden",
            GatewayError::RateLimited { message, .. } => message.as_str(),
            GatewayError::Configuration(detail) | GatewayError::Internal(detail) => {
                tracing::error!(kind = self.kind(), detail = %detail, "Request failed");
                "Internal Server Error"
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
