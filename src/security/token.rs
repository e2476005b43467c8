//! Signed, time-bound identity tokens.
//!
//! Tokens are HS256 JWTs. The payload is the caller's claims plus `iat` and
//! `exp` (Unix seconds). The service keeps no token state.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TokenError {
    /// No signing secret is configured.
    #[error("token signing secret is not configured")]
    Configuration,

    /// The token is malformed, forged or expired.
    #[error("token rejected: {0}")]
    Authentication(String),
}

/// Claim set carried by a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Caller-supplied identity fields.
    #[serde(flatten)]
    pub subject: Map<String, Value>,

    /// Issued-at, Unix seconds.
    pub iat: i64,

    /// Expiry, Unix seconds. The token is valid strictly before this instant.
    pub exp: i64,
}

impl Claims {
    pub fn role(&self) -> Option<&str> {
        self.subject.get("role").and_then(Value::as_str)
    }

    pub fn sub(&self) -> Option<&str> {
        self.subject.get("sub").and_then(Value::as_str)
    }
}

/// Issues and verifies tokens with a shared secret.
pub struct TokenService {
    secret: Option<String>,
}

impl TokenService {
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Issue a token valid for `duration_days` from now.
    pub fn issue(&self, duration_days: u32, claims: Map<String, Value>) -> Result<String, TokenError> {
        self.issue_at(Utc::now(), duration_days, claims)
    }

    /// Issue a token as if at `issued_at`.
    pub fn issue_at(
        &self,
        issued_at: DateTime<Utc>,
        duration_days: u32,
        mut subject: Map<String, Value>,
    ) -> Result<String, TokenError> {
        let secret = self.secret.as_deref().ok_or(TokenError::Configuration)?;

        subject.remove("iat");
        subject.remove("exp");

        let iat = issued_at.timestamp();
        let exp = iat + Duration::days(i64::from(duration_days)).num_seconds();
        let claims = Claims { subject, iat, exp };

        debug!(sub = ?claims.sub(), role = ?claims.role(), exp, "Issuing token");

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| TokenError::Authentication(e.to_string()))
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if at `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let secret = self.secret.as_deref().ok_or(TokenError::Configuration)?;

        if token.is_empty() {
            return Err(TokenError::Authentication("empty token".to_string()));
        }

        // Expiry is checked below against `now` with no leeway.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        // `aud` is an ordinary subject field here.
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map_err(|e| TokenError::Authentication(e.to_string()))?
        .claims;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Authentication("token expired".to_string()));
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("configured", &self.is_configured())
            .finish()
    }
}
