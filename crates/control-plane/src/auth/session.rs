// Session issuer: password login and token validation
//
// Verifies a username/password pair against the credential store and issues a
// signed, time-limited session token. Tokens are stateless; nothing is stored
// server-side.

use chrono::{DateTime, TimeZone, Utc};
use newsdesk_core::{CredentialStore, NewsdeskError, Result};
use std::sync::Arc;

use super::jwt::{IssuedToken, JwtService};
use super::password::verify_password;

/// Identity carried by a valid session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionIssuer {
    credentials: Arc<dyn CredentialStore>,
    jwt: Arc<JwtService>,
}

impl SessionIssuer {
    pub fn new(credentials: Arc<dyn CredentialStore>, jwt: Arc<JwtService>) -> Self {
        Self { credentials, jwt }
    }

    /// Check a username/password pair and issue a session token
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<IssuedToken> {
        let user = self
            .credentials
            .get(username)
            .await?
            .ok_or(NewsdeskError::InvalidCredentials)?;

        // Argon2 is deliberately slow; keep it off the async workers
        let password = password.to_string();
        let hash = user.password_hash;
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| NewsdeskError::storage(format!("password verification aborted: {e}")))?;

        match verified {
            Ok(true) => {}
            Ok(false) => return Err(NewsdeskError::InvalidCredentials),
            Err(e) => {
                tracing::error!(username = %username, "Stored password hash unusable: {}", e);
                return Err(NewsdeskError::InvalidCredentials);
            }
        }

        self.jwt
            .generate_access_token(username)
            .map_err(|e| NewsdeskError::storage(format!("failed to sign token: {e}")))
    }

    /// Decode a session token into the identity it carries
    pub fn validate(&self, token: &str) -> Result<Identity> {
        let claims = self.jwt.validate_access_token(token).map_err(|e| {
            tracing::debug!("JWT validation failed: {:#}", e);
            NewsdeskError::unauthenticated("Invalid or expired token")
        })?;

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| NewsdeskError::unauthenticated("Invalid token expiry"))?;

        Ok(Identity {
            username: claims.sub,
            expires_at,
        })
    }
}
