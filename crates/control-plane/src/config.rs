// Server configuration loaded from environment variables.
// Decision: `.env` is loaded by main via dotenvy before this runs
// Decision: Backends are chosen by STORAGE_BACKEND / CREDENTIAL_BACKEND; production defaults (r2, kv)

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::AuthConfig;
use crate::storage::{KvConfig, S3Config};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;
const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(30);

/// Where articles and images are stored
#[derive(Debug, Clone)]
pub enum StorageBackendConfig {
    /// Cloudflare R2 (or any S3-compatible store)
    R2(S3Config),
    /// Local directory
    Fs { root: PathBuf },
    /// Process memory, lost on restart
    Memory,
}

/// Where publisher accounts are looked up
#[derive(Debug, Clone)]
pub enum CredentialBackendConfig {
    /// Cloudflare Workers KV
    Kv(KvConfig),
    /// JSON file mapping username to password hash
    File { path: PathBuf },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub auth: AuthConfig,
    pub storage: StorageBackendConfig,
    pub credentials: CredentialBackendConfig,
    /// Timeout for HTTP calls to the object and credential stores
    pub store_timeout: Duration,
    /// Request body limit for uploads
    pub max_upload_bytes: usize,
    /// Answer failed saves/deletes with HTTP 200 like the first client expected
    pub legacy_error_status: bool,
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    match lookup(key) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => bail!("{} environment variable required", key),
    }
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> bool {
    lookup(key)
        .map(|s| s.to_lowercase() == "true" || s == "1")
        .unwrap_or(false)
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let auth = AuthConfig::from_lookup(&lookup)?;

        let port = match lookup("PORT") {
            Some(p) => p.parse().with_context(|| format!("Invalid PORT: {}", p))?,
            None => DEFAULT_PORT,
        };

        let storage = match lookup("STORAGE_BACKEND")
            .unwrap_or_else(|| "r2".to_string())
            .to_lowercase()
            .as_str()
        {
            "r2" | "s3" => {
                let account_id = lookup("R2_ACCOUNT_ID");
                let endpoint = match (lookup("R2_ENDPOINT"), account_id) {
                    (Some(endpoint), _) if !endpoint.is_empty() => endpoint,
                    (_, Some(account)) if !account.is_empty() => {
                        format!("https://{account}.r2.cloudflarestorage.com")
                    }
                    _ => bail!("R2_ACCOUNT_ID or R2_ENDPOINT environment variable required"),
                };
                StorageBackendConfig::R2(S3Config {
                    endpoint,
                    bucket: required(&lookup, "R2_BUCKET")?,
                    access_key: required(&lookup, "R2_ACCESS_KEY")?,
                    secret_key: required(&lookup, "R2_SECRET_KEY")?,
                    region: lookup("R2_REGION").unwrap_or_else(|| "auto".to_string()),
                })
            }
            "fs" => StorageBackendConfig::Fs {
                root: lookup("STORAGE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("./data")),
            },
            "memory" => StorageBackendConfig::Memory,
            other => bail!("Unknown STORAGE_BACKEND: {}", other),
        };

        let credentials = match lookup("CREDENTIAL_BACKEND")
            .unwrap_or_else(|| "kv".to_string())
            .to_lowercase()
            .as_str()
        {
            "kv" => CredentialBackendConfig::Kv(KvConfig {
                account_id: required(&lookup, "CF_ACCOUNT_ID")?,
                namespace_id: required(&lookup, "CF_NAMESPACE_ID")?,
                api_token: required(&lookup, "CF_API_TOKEN")?,
                api_base: lookup("CF_API_BASE"),
            }),
            "file" => CredentialBackendConfig::File {
                path: PathBuf::from(required(&lookup, "CREDENTIALS_FILE")?),
            },
            other => bail!("Unknown CREDENTIAL_BACKEND: {}", other),
        };

        let store_timeout = lookup("STORE_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_STORE_TIMEOUT);

        let max_upload_bytes = lookup("MAX_UPLOAD_BYTES")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        Ok(Self {
            port,
            auth,
            storage,
            credentials,
            store_timeout,
            max_upload_bytes,
            legacy_error_status: flag(&lookup, "LEGACY_ERROR_STATUS"),
        })
    }

    /// Short backend names for startup logging
    pub fn describe_backends(&self) -> (&'static str, &'static str) {
        let storage = match self.storage {
            StorageBackendConfig::R2(_) => "r2",
            StorageBackendConfig::Fs { .. } => "fs",
            StorageBackendConfig::Memory => "memory",
        };
        let credentials = match self.credentials {
            CredentialBackendConfig::Kv(_) => "kv",
            CredentialBackendConfig::File { .. } => "file",
        };
        (storage, credentials)
    }
}
