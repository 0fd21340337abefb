// Newsdesk API server
// Decision: All configuration from environment variables, `.env` honoured in development

use anyhow::{Context, Result};
use newsdesk_control_plane::auth::{AuthState, JwtService, SessionIssuer};
use newsdesk_control_plane::config::AppConfig;
use newsdesk_control_plane::{build_router, storage, AppState};
use newsdesk_core::ArticleRepository;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // RUST_LOG overrides the default filter
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("newsdesk=debug,tower_http=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let (storage_backend, credential_backend) = config.describe_backends();
    tracing::info!(
        storage = storage_backend,
        credentials = credential_backend,
        token_lifetime_secs = config.auth.jwt.access_token_lifetime.as_secs(),
        legacy_error_status = config.legacy_error_status,
        "Configuration loaded"
    );

    let objects = storage::create_object_store(&config)?;
    let credentials = storage::create_credential_store(&config)?;

    let jwt = Arc::new(JwtService::new(config.auth.jwt.clone()));
    let issuer = SessionIssuer::new(credentials, jwt);

    let state = AppState {
        repository: Arc::new(ArticleRepository::new(objects)),
        auth: AuthState::new(issuer, &config.auth.api_key),
        legacy_error_status: config.legacy_error_status,
        max_upload_bytes: config.max_upload_bytes,
    };
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
