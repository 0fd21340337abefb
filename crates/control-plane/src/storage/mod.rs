// Store adapters for the core traits
// Decision: Object store is R2 in production, a local directory or memory in dev mode
// Decision: Credentials come from Cloudflare KV in production, a JSON file in dev mode
//
// - S3ObjectStore: ObjectStore over the S3 REST API (Cloudflare R2)
// - FsObjectStore: ObjectStore under a local directory
// - KvCredentialStore: CredentialStore over the Cloudflare KV REST API

pub mod fs;
pub mod kv;
pub mod s3;
pub mod sigv4;

pub use fs::FsObjectStore;
pub use kv::{KvConfig, KvCredentialStore};
pub use s3::{S3Config, S3ObjectStore};

use anyhow::{Context, Result};
use newsdesk_core::{CredentialStore, InMemoryCredentialStore, InMemoryObjectStore, ObjectStore};
use std::sync::Arc;

use crate::config::{AppConfig, CredentialBackendConfig, StorageBackendConfig};

/// Build the object store selected by configuration
pub fn create_object_store(config: &AppConfig) -> Result<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match &config.storage {
        StorageBackendConfig::R2(s3) => {
            tracing::info!(endpoint = %s3.endpoint, bucket = %s3.bucket, "Using R2 object store");
            Arc::new(
                S3ObjectStore::new(s3.clone(), config.store_timeout)
                    .context("Failed to create R2 client")?,
            )
        }
        StorageBackendConfig::Fs { root } => {
            std::fs::create_dir_all(root)
                .with_context(|| format!("Failed to create storage dir {}", root.display()))?;
            tracing::info!(root = %root.display(), "Using filesystem object store");
            Arc::new(FsObjectStore::new(root.clone()))
        }
        StorageBackendConfig::Memory => {
            tracing::warn!("Using in-memory object store; articles are lost on restart");
            Arc::new(InMemoryObjectStore::new())
        }
    };
    Ok(store)
}

/// Build the credential store selected by configuration
pub fn create_credential_store(config: &AppConfig) -> Result<Arc<dyn CredentialStore>> {
    let store: Arc<dyn CredentialStore> = match &config.credentials {
        CredentialBackendConfig::Kv(kv) => {
            tracing::info!(namespace = %kv.namespace_id, "Using Cloudflare KV credential store");
            Arc::new(
                KvCredentialStore::new(kv.clone(), config.store_timeout)
                    .context("Failed to create KV client")?,
            )
        }
        CredentialBackendConfig::File { path } => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read credentials file {}", path.display()))?;
            let store = InMemoryCredentialStore::from_json(&raw)
                .with_context(|| format!("Failed to parse credentials file {}", path.display()))?;
            tracing::info!(path = %path.display(), users = store.len(), "Using file credential store");
            Arc::new(store)
        }
    };
    Ok(store)
}
