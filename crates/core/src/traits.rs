// Core traits for pluggable stores
//
// These traits allow the article repository and session issuer to be used with
// different backends:
// - In-memory implementations for dev mode and testing
// - S3-compatible object storage and Cloudflare KV for production
// - A local directory for single-machine deployments

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

// ============================================================================
// ObjectStore - Blob storage addressed by key
// ============================================================================

/// Key/value blob storage
///
/// A missing key is not an error: `get` returns `None` and `delete` succeeds.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `body` under `key`, replacing any existing object
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()>;

    /// Fetch the object stored under `key`
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Remove the object stored under `key`
    async fn delete(&self, key: &str) -> Result<()>;
}

// ============================================================================
// CredentialStore - Publisher accounts
// ============================================================================

/// Stored credentials for one publisher account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// PHC-format password hash
    pub password_hash: String,
    /// Any other fields provisioned alongside the hash
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl UserRecord {
    pub fn new(password_hash: impl Into<String>) -> Self {
        Self {
            password_hash: password_hash.into(),
            metadata: Map::new(),
        }
    }
}

/// Read-only lookup of publisher accounts by username
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a user; `None` if the account does not exist
    async fn get(&self, username: &str) -> Result<Option<UserRecord>>;
}
