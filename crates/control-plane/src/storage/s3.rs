// S3-compatible object store (Cloudflare R2)
// Decision: Talk to the S3 REST API directly with reqwest + SigV4 instead of an SDK
// Decision: Path-style addressing (`<endpoint>/<bucket>/<key>`), works for R2 and MinIO

use async_trait::async_trait;
use chrono::Utc;
use newsdesk_core::{NewsdeskError, ObjectStore, Result};
use reqwest::{header, Method, StatusCode, Url};
use std::time::Duration;

use super::sigv4::{payload_hash, uri_encode, SigV4Signer};

/// Connection settings for an S3-compatible bucket
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Base URL, e.g. `https://<account>.r2.cloudflarestorage.com`
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    /// R2 uses `auto`
    pub region: String,
}

pub struct S3ObjectStore {
    http: reqwest::Client,
    endpoint: String,
    host: String,
    bucket: String,
    signer: SigV4Signer,
}

impl S3ObjectStore {
    pub fn new(config: S3Config, timeout: Duration) -> anyhow::Result<Self> {
        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        let url = Url::parse(&endpoint)
            .map_err(|e| anyhow::anyhow!("Invalid object store endpoint {}: {}", endpoint, e))?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => anyhow::bail!("Object store endpoint has no host: {}", endpoint),
        };

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            endpoint,
            host,
            bucket: config.bucket,
            signer: SigV4Signer::new(config.access_key, config.secret_key, config.region, "s3"),
        })
    }

    fn canonical_uri(&self, key: &str) -> String {
        format!("/{}/{}", uri_encode(&self.bucket, true), uri_encode(key, false))
    }

    fn request(&self, method: Method, key: &str, body: &[u8]) -> reqwest::RequestBuilder {
        let now = Utc::now();
        let amz_date = SigV4Signer::amz_date(now);
        let content_hash = payload_hash(body);
        let canonical_uri = self.canonical_uri(key);

        let authorization = self.signer.authorization(
            method.as_str(),
            &canonical_uri,
            &[
                ("host", self.host.as_str()),
                ("x-amz-content-sha256", content_hash.as_str()),
                ("x-amz-date", amz_date.as_str()),
            ],
            &content_hash,
            now,
        );

        self.http
            .request(method, format!("{}{}", self.endpoint, canonical_uri))
            .header("x-amz-content-sha256", content_hash)
            .header("x-amz-date", amz_date)
            .header(header::AUTHORIZATION, authorization)
    }

    async fn error_from(response: reqwest::Response, action: &str, key: &str) -> NewsdeskError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(key = %key, status = %status, body = %body, "Object store error response");
        NewsdeskError::storage(format!("{action} {key} failed with status {status}"))
    }
}

fn transport_error(action: &str, key: &str, e: reqwest::Error) -> NewsdeskError {
    NewsdeskError::storage(format!("{action} {key} failed: {e}"))
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        let response = self
            .request(Method::PUT, key, &body)
            .header(header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| transport_error("put", key, e))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, "put", key).await);
        }
        tracing::debug!(key = %key, "Object stored");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let response = self
            .request(Method::GET, key, b"")
            .send()
            .await
            .map_err(|e| transport_error("get", key, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_from(response, "get", key).await);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error("get", key, e))?;
        Ok(Some(bytes.to_vec()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let response = self
            .request(Method::DELETE, key, b"")
            .send()
            .await
            .map_err(|e| transport_error("delete", key, e))?;

        // S3 answers 204 whether or not the key existed
        if response.status().is_success() || response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(key = %key, "Object deleted");
            return Ok(());
        }
        Err(Self::error_from(response, "delete", key).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_bytes, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(server: &MockServer) -> S3ObjectStore {
        S3ObjectStore::new(
            S3Config {
                endpoint: server.uri(),
                bucket: "news".to_string(),
                access_key: "AKID".to_string(),
                secret_key: "SECRET".to_string(),
                region: "auto".to_string(),
            },
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_put_signs_request() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/news/articles.json"))
            .and(header("content-type", "application/json"))
            .and(header_exists("x-amz-date"))
            .and(header(
                "x-amz-content-sha256",
                payload_hash(b"[]").as_str(),
            ))
            .and(body_bytes(b"[]".to_vec()))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        store(&server)
            .put("articles.json", b"[]".to_vec(), "application/json")
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let authorization = requests[0]
            .headers
            .get("authorization")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(authorization.starts_with("AWS4-HMAC-SHA256 Credential=AKID/"));
        assert!(authorization.contains("/auto/s3/aws4_request"));
        assert!(authorization.contains("SignedHeaders=host;x-amz-content-sha256;x-amz-date"));
    }

    #[tokio::test]
    async fn test_get_existing_and_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news/articles.json"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"[]".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/news/articles/missing.json"))
            .respond_with(ResponseTemplate::new(404).set_body_string("<Error><Code>NoSuchKey</Code></Error>"))
            .mount(&server)
            .await;

        let store = store(&server);
        assert_eq!(
            store.get("articles.json").await.unwrap(),
            Some(b"[]".to_vec())
        );
        assert_eq!(store.get("articles/missing.json").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_server_error_is_storage_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = store(&server).get("articles.json").await.unwrap_err();
        assert!(err.is_storage());
    }

    #[tokio::test]
    async fn test_delete() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/news/articles_images/20240101_a.png"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        store(&server)
            .delete("articles_images/20240101_a.png")
            .await
            .unwrap();
    }

    #[test]
    fn test_invalid_endpoint() {
        let result = S3ObjectStore::new(
            S3Config {
                endpoint: "not a url".to_string(),
                bucket: "b".to_string(),
                access_key: "a".to_string(),
                secret_key: "s".to_string(),
                region: "auto".to_string(),
            },
            Duration::from_secs(5),
        );
        assert!(result.is_err());
    }
}
