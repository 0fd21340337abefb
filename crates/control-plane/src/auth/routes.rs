// Authentication HTTP routes
// Decision: Single password login endpoint; no signup, refresh, or lockout
// Decision: Unreadable or incomplete login bodies are answered like bad credentials

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use newsdesk_core::NewsdeskError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::middleware::{AuthError, AuthState};

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "LY001")]
    pub username: String,
    pub password: String,
}

/// Token response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// Session token to send as `Authorization: Bearer <token>`
    pub token: String,
}

/// Create auth routes
pub fn routes(state: AuthState) -> Router {
    Router::new()
        .route("/login", post(login))
        .with_state(state)
}

/// POST /login - Login with username and password
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = crate::api::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AuthState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AuthError> {
    let Json(req) = body.map_err(|e| {
        tracing::warn!("Login body rejected: {}", e.body_text());
        AuthError::from(NewsdeskError::InvalidCredentials)
    })?;

    let issued = state
        .issuer
        .authenticate(&req.username, &req.password)
        .await
        .map_err(|e| {
            tracing::warn!(username = %req.username, "Login failed: {}", e);
            AuthError::from(e)
        })?;

    tracing::info!(username = %req.username, expires_at = %issued.expires_at, "Login succeeded");
    Ok(Json(TokenResponse {
        token: issued.token,
    }))
}
