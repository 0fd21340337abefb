// In-memory store implementations for dev mode and tests
// Decision: Use parking_lot for thread-safe access
//
// All data is stored in memory and lost on restart.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{NewsdeskError, Result};
use crate::traits::{CredentialStore, ObjectStore, UserRecord};

#[derive(Debug, Clone)]
struct StoredObject {
    body: Vec<u8>,
    content_type: String,
}

/// In-memory object store
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    fail_deletes: AtomicBool,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored keys, sorted
    pub fn keys(&self) -> Vec<String> {
        self.objects.read().keys().cloned().collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.read().contains_key(key)
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects.read().get(key).map(|o| o.content_type.clone())
    }

    /// Make every subsequent `delete` fail with a storage error
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        self.objects.write().insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.objects.read().get(key).map(|o| o.body.clone()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(NewsdeskError::storage(format!("delete of {key} rejected")));
        }
        self.objects.write().remove(key);
        Ok(())
    }
}

/// Credentials file entry: either a bare hash or a full record
#[derive(Deserialize)]
#[serde(untagged)]
enum CredentialEntry {
    Hash(String),
    Record(UserRecord),
}

/// In-memory credential store
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON object mapping username to a password hash or record,
    /// as printed by the `hash-password` tool
    pub fn from_json(raw: &str) -> Result<Self> {
        let entries: HashMap<String, CredentialEntry> = serde_json::from_str(raw)
            .map_err(|e| NewsdeskError::malformed(format!("invalid credentials file: {e}")))?;

        let users = entries
            .into_iter()
            .map(|(username, entry)| {
                let record = match entry {
                    CredentialEntry::Hash(hash) => UserRecord::new(hash),
                    CredentialEntry::Record(record) => record,
                };
                (username, record)
            })
            .collect();

        Ok(Self {
            users: RwLock::new(users),
        })
    }

    pub fn insert(&self, username: impl Into<String>, record: UserRecord) {
        self.users.write().insert(username.into(), record);
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self, username: &str) -> Result<Option<UserRecord>> {
        Ok(self.users.read().get(username).cloned())
    }
}
