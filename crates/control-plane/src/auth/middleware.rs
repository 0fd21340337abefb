// Authentication extractors
// Decision: Session token and shared API key are two independent guards;
//           mutating routes take both as extractors
// Decision: Token is read from the Authorization header only (no cookies)

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use newsdesk_core::NewsdeskError;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use super::session::{Identity, SessionIssuer};

/// Header carrying the shared secret
pub static API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// Authentication error
#[derive(Debug, Clone, Serialize)]
pub struct AuthError {
    pub error: String,
    #[serde(skip)]
    pub status: StatusCode,
}

impl AuthError {
    pub fn unauthorized(message: &str) -> Self {
        Self {
            error: message.to_string(),
            status: StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<NewsdeskError> for AuthError {
    fn from(err: NewsdeskError) -> Self {
        match err {
            NewsdeskError::InvalidCredentials => Self::unauthorized("invalid credentials"),
            NewsdeskError::Unauthenticated(msg) => Self::unauthorized(&msg),
            NewsdeskError::InvalidApiKey => Self::unauthorized("Invalid API Key"),
            other => {
                tracing::error!("Authentication backend error: {}", other);
                Self {
                    error: "authentication unavailable".to_string(),
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                }
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Auth state shared across routes
#[derive(Clone)]
pub struct AuthState {
    pub issuer: SessionIssuer,
    api_key_digest: Arc<[u8; 32]>,
}

impl AuthState {
    pub fn new(issuer: SessionIssuer, api_key: &str) -> Self {
        Self {
            issuer,
            api_key_digest: Arc::new(digest(api_key)),
        }
    }

    /// Compare a presented API key with the configured one.
    ///
    /// Digests are compared so the check does not depend on key length or
    /// on how many leading bytes match.
    pub fn api_key_matches(&self, presented: &str) -> bool {
        digest(presented) == *self.api_key_digest
    }
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

/// Publisher identity from a valid `Authorization: Bearer` session token
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AuthError::unauthorized("Missing Authorization Header"))?;

        let token = auth_header
            .to_str()
            .ok()
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::unauthorized("Invalid authorization header"))?;

        let identity = auth_state.issuer.validate(token)?;
        Ok(AuthUser(identity))
    }
}

/// Proof that the request carried the configured `X-API-KEY`
#[derive(Debug, Clone, Copy)]
pub struct ApiKeyGuard;

#[async_trait]
impl<S> FromRequestParts<S> for ApiKeyGuard
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let presented = parts
            .headers
            .get(&API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if !auth_state.api_key_matches(presented) {
            tracing::debug!("Rejected request with invalid API key");
            return Err(NewsdeskError::InvalidApiKey.into());
        }

        Ok(ApiKeyGuard)
    }
}
