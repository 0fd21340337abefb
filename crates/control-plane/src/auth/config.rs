// Authentication configuration loaded from environment variables.
// Decision: Signing secret and shared API key are required; there is no anonymous mode

use anyhow::{bail, Result};
use std::time::Duration;

/// Default session lifetime: one hour
pub const DEFAULT_ACCESS_TOKEN_LIFETIME: Duration = Duration::from_secs(60 * 60);

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWTs
    pub secret: String,
    /// Access token lifetime
    pub access_token_lifetime: Duration,
}

/// Complete authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt: JwtConfig,
    /// Shared secret expected in the `X-API-KEY` header on mutating routes
    pub api_key: String,
}

impl AuthConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let secret = match lookup("JWT_SECRET_KEY") {
            Some(s) if !s.is_empty() => s,
            _ => bail!("JWT_SECRET_KEY environment variable required"),
        };

        let api_key = match lookup("API_KEY") {
            Some(s) if !s.is_empty() => s,
            _ => bail!("API_KEY environment variable required"),
        };

        let access_token_lifetime = lookup("JWT_ACCESS_TOKEN_LIFETIME")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_ACCESS_TOKEN_LIFETIME);

        Ok(Self {
            jwt: JwtConfig {
                secret,
                access_token_lifetime,
            },
            api_key,
        })
    }
}
