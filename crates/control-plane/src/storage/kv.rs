// Cloudflare Workers KV credential store
//
// Accounts are provisioned externally under `user:<username>` keys, each value a
// JSON object with at least `password_hash`.

use async_trait::async_trait;
use newsdesk_core::{CredentialStore, NewsdeskError, Result, UserRecord};
use reqwest::StatusCode;
use std::time::Duration;

use super::sigv4::uri_encode;

const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Cloudflare KV namespace settings
#[derive(Debug, Clone)]
pub struct KvConfig {
    pub account_id: String,
    pub namespace_id: String,
    pub api_token: String,
    /// Override for the Cloudflare API base URL
    pub api_base: Option<String>,
}

pub struct KvCredentialStore {
    http: reqwest::Client,
    values_url: String,
    api_token: String,
}

impl KvCredentialStore {
    pub fn new(config: KvConfig, timeout: Duration) -> anyhow::Result<Self> {
        let base = config
            .api_base
            .as_deref()
            .unwrap_or(CLOUDFLARE_API_BASE)
            .trim_end_matches('/');
        let values_url = format!(
            "{base}/accounts/{}/storage/kv/namespaces/{}/values",
            config.account_id, config.namespace_id
        );
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            values_url,
            api_token: config.api_token,
        })
    }

    fn user_url(&self, username: &str) -> String {
        format!(
            "{}/{}",
            self.values_url,
            uri_encode(&format!("user:{username}"), true)
        )
    }
}

#[async_trait]
impl CredentialStore for KvCredentialStore {
    async fn get(&self, username: &str) -> Result<Option<UserRecord>> {
        let response = self
            .http
            .get(self.user_url(username))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| NewsdeskError::storage(format!("credential lookup failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(NewsdeskError::storage(format!(
                "credential lookup failed with status {status}"
            )));
        }

        let record = response
            .json::<UserRecord>()
            .await
            .map_err(|e| NewsdeskError::storage(format!("invalid credential record: {e}")))?;
        Ok(Some(record))
    }
}
