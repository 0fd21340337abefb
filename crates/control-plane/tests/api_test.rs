// In-process tests for the Newsdesk HTTP API
// Drives the full router (auth guards, CORS, body limit) against in-memory stores.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::{Duration as ChronoDuration, Utc};
use http_body_util::BodyExt;
use newsdesk_control_plane::auth::password::hash_password;
use newsdesk_control_plane::auth::{AuthState, JwtConfig, JwtService, SessionIssuer};
use newsdesk_control_plane::{build_router, AppState};
use newsdesk_core::{
    ArticleRepository, InMemoryCredentialStore, InMemoryObjectStore, ObjectStore, UserRecord,
};
use serde_json::{json, Value};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tower::ServiceExt;

const API_KEY: &str = "test-api-key";
const BOUNDARY: &str = "newsdesk-test-boundary";

struct TestApp {
    router: Router,
    store: Arc<InMemoryObjectStore>,
    jwt: Arc<JwtService>,
}

// Argon2 is slow in debug builds; hash once for the whole file
fn password_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password("correct horse").unwrap())
}

fn test_app_with(legacy_error_status: bool, max_upload_bytes: usize) -> TestApp {
    let store = Arc::new(InMemoryObjectStore::new());
    let credentials = InMemoryCredentialStore::new();
    credentials.insert("LY001", UserRecord::new(password_hash()));

    let jwt = Arc::new(JwtService::new(JwtConfig {
        secret: "test-secret".to_string(),
        access_token_lifetime: Duration::from_secs(3600),
    }));
    let issuer = SessionIssuer::new(Arc::new(credentials), jwt.clone());

    let router = build_router(AppState {
        repository: Arc::new(ArticleRepository::new(store.clone())),
        auth: AuthState::new(issuer, API_KEY),
        legacy_error_status,
        max_upload_bytes,
    });

    TestApp { router, store, jwt }
}

fn test_app() -> TestApp {
    test_app_with(false, 16 * 1024 * 1024)
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    fn token(&self) -> String {
        self.jwt.generate_access_token("LY001").unwrap().token
    }

    async fn index(&self) -> Value {
        match self.store.get("articles.json").await.unwrap() {
            Some(bytes) => serde_json::from_slice(&bytes).unwrap(),
            None => json!([]),
        }
    }
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn multipart_body(data: &str, image: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"data\"\r\n\r\n{data}\r\n"
        )
        .as_bytes(),
    );
    if let Some((file_name, content_type, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn save_request(token: Option<&str>, api_key: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/save")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some(api_key) = api_key {
        builder = builder.header("X-API-KEY", api_key);
    }
    builder.body(Body::from(body)).unwrap()
}

fn delete_request(token: &str, api_key: &str, filename: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(format!("/delete?filename={filename}"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header("X-API-KEY", api_key)
        .body(Body::empty())
        .unwrap()
}

const ARTICLE: &str = r#"{"title":"A","subtitle":"s","content":"c","date":"2024-01-01"}"#;

#[tokio::test]
async fn test_login() {
    let app = test_app();

    let response = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"username": "LY001", "password": "correct horse"}).to_string(),
                ))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let token = body["token"].as_str().unwrap();
    let claims = app.jwt.validate_access_token(token).unwrap();
    assert_eq!(claims.sub, "LY001");
    assert_eq!(claims.exp - claims.iat, 3600);
}

#[tokio::test]
async fn test_login_rejected() {
    let app = test_app();

    for (username, password) in [("LY001", "wrong"), ("nobody", "correct horse")] {
        let response = app
            .send(
                Request::builder()
                    .method(Method::POST)
                    .uri("/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"username": username, "password": password}).to_string(),
                    ))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await,
            json!({"error": "invalid credentials"})
        );
    }
}

#[tokio::test]
async fn test_login_malformed_body() {
    let app = test_app();

    let bodies = [
        ("application/json", json!({"username": "LY001"}).to_string()),
        ("application/json", "not json".to_string()),
        ("text/plain", json!({"username": "LY001", "password": "correct horse"}).to_string()),
    ];
    for (content_type, body) in bodies {
        let response = app
            .send(
                Request::builder()
                    .method(Method::POST)
                    .uri("/login")
                    .header(header::CONTENT_TYPE, content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await,
            json!({"error": "invalid credentials"})
        );
    }
}

#[tokio::test]
async fn test_save_and_delete_without_image() {
    let app = test_app();
    let token = app.token();

    let existing = json!([{
        "filename": "news_20230101000000000000.json",
        "title": "Old",
        "subtitle": "o",
        "content": "old",
        "date": "2023-01-01",
        "image": null
    }]);
    app.store
        .put(
            "articles.json",
            serde_json::to_vec(&existing).unwrap(),
            "application/json",
        )
        .await
        .unwrap();

    let response = app
        .send(save_request(
            Some(&token),
            Some(API_KEY),
            multipart_body(ARTICLE, None),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"success": true}));

    let index = app.index().await;
    let entries = index.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1], existing[0]);

    let entry = &entries[0];
    let filename = entry["filename"].as_str().unwrap().to_string();
    assert!(filename.starts_with("news_") && filename.ends_with(".json"));
    assert_eq!(entry["title"], "A");
    assert_eq!(entry["subtitle"], "s");
    assert_eq!(entry["content"], "c");
    assert_eq!(entry["date"], "2024-01-01");
    assert_eq!(entry["image"], Value::Null);
    assert!(app.store.contains(&format!("articles/{filename}")));

    let response = app.send(delete_request(&token, API_KEY, &filename)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"success": true}));

    assert_eq!(app.index().await, existing);
    assert!(!app.store.contains(&format!("articles/{filename}")));
}

#[tokio::test]
async fn test_save_with_image() {
    let app = test_app();
    let token = app.token();

    let response = app
        .send(save_request(
            Some(&token),
            Some(API_KEY),
            multipart_body(ARTICLE, Some(("cover.png", "image/png", b"\x89PNG data"))),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let index = app.index().await;
    let image = index[0]["image"].as_str().unwrap().to_string();
    assert!(image.starts_with("articles_images/"));
    assert!(image.ends_with("_cover.png"));
    assert_eq!(app.store.content_type(&image).as_deref(), Some("image/png"));
    assert_eq!(
        app.store.get(&image).await.unwrap(),
        Some(b"\x89PNG data".to_vec())
    );

    // Detail object carries the same image key
    let filename = index[0]["filename"].as_str().unwrap().to_string();
    let response = app
        .send(
            Request::builder()
                .uri(format!("/articles/{filename}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["image"], image.as_str());

    let response = app.send(delete_request(&token, API_KEY, &filename)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!app.store.contains(&image));
    assert_eq!(app.index().await, json!([]));
}

#[tokio::test]
async fn test_save_rejects_bad_data() {
    let app = test_app();
    let token = app.token();

    let response = app
        .send(save_request(
            Some(&token),
            Some(API_KEY),
            multipart_body("not json", None),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("invalid article data"));
    assert!(app.store.keys().is_empty());
}

#[tokio::test]
async fn test_save_storage_failure() {
    let app = test_app();
    let token = app.token();
    app.store
        .put("articles.json", b"{corrupt".to_vec(), "application/json")
        .await
        .unwrap();

    let response = app
        .send(save_request(
            Some(&token),
            Some(API_KEY),
            multipart_body(ARTICLE, None),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({"success": false, "error": "storage failure"})
    );

    // Corrupt index is left for an operator, never overwritten
    assert_eq!(
        app.store.get("articles.json").await.unwrap(),
        Some(b"{corrupt".to_vec())
    );
}

#[tokio::test]
async fn test_legacy_error_status() {
    let app = test_app_with(true, 16 * 1024 * 1024);
    let token = app.token();

    let response = app
        .send(save_request(
            Some(&token),
            Some(API_KEY),
            multipart_body("not json", None),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_upload_limit() {
    let app = test_app_with(false, 1024);
    let token = app.token();
    let large = vec![7u8; 4096];

    let response = app
        .send(save_request(
            Some(&token),
            Some(API_KEY),
            multipart_body(ARTICLE, Some(("big.jpg", "image/jpeg", &large))),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(response).await["success"], false);
    assert!(app.store.keys().is_empty());
}

#[tokio::test]
async fn test_delete_unknown_article() {
    let app = test_app();
    let token = app.token();

    let response = app
        .send(save_request(
            Some(&token),
            Some(API_KEY),
            multipart_body(ARTICLE, None),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let before = app.index().await;

    let response = app
        .send(delete_request(&token, API_KEY, "news_19990101000000000000.json"))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert!(body["error"].is_string());

    assert_eq!(app.index().await, before);
}

#[tokio::test]
async fn test_delete_requires_filename() {
    let app = test_app();
    let token = app.token();

    let response = app
        .send(
            Request::builder()
                .method(Method::DELETE)
                .uri("/delete")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header("X-API-KEY", API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wrong_api_key_with_valid_token() {
    let app = test_app();
    let token = app.token();

    let response = app
        .send(save_request(
            Some(&token),
            Some("wrong-key"),
            multipart_body(ARTICLE, None),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, json!({"error": "Invalid API Key"}));

    let response = app
        .send(save_request(Some(&token), None, multipart_body(ARTICLE, None)))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .send(delete_request(&token, "wrong-key", "news_1.json"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    assert!(app.store.keys().is_empty());
}

#[tokio::test]
async fn test_valid_api_key_without_valid_token() {
    let app = test_app();

    let response = app
        .send(save_request(None, Some(API_KEY), multipart_body(ARTICLE, None)))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let expired = app
        .jwt
        .generate_access_token_at("LY001", Utc::now() - ChronoDuration::hours(2))
        .unwrap()
        .token;
    let response = app
        .send(save_request(
            Some(&expired),
            Some(API_KEY),
            multipart_body(ARTICLE, None),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .send(save_request(
            Some("not-a-token"),
            Some(API_KEY),
            multipart_body(ARTICLE, None),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    assert!(app.store.keys().is_empty());
}

#[tokio::test]
async fn test_options_delete() {
    let app = test_app();

    let response = app
        .send(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/delete")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"success": true}));
}

#[tokio::test]
async fn test_delete_preflight() {
    let app = test_app();

    let response = app
        .send(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/delete?filename=news_20240101120000000000.json")
                .header(header::ORIGIN, "https://publisher.example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
                .header(
                    header::ACCESS_CONTROL_REQUEST_HEADERS,
                    "authorization,x-api-key",
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(body_json(response).await, json!({"success": true}));
}

#[tokio::test]
async fn test_options_elsewhere_has_no_body() {
    let app = test_app();

    let response = app
        .send(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/save")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = test_app();

    let response = app
        .send(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/save")
                .header(header::ORIGIN, "https://publisher.example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(
                    header::ACCESS_CONTROL_REQUEST_HEADERS,
                    "authorization,x-api-key",
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let allowed_headers = headers[header::ACCESS_CONTROL_ALLOW_HEADERS]
        .to_str()
        .unwrap()
        .to_lowercase();
    for name in ["content-type", "authorization", "x-api-key"] {
        assert!(allowed_headers.contains(name), "missing {name}");
    }
    let allowed_methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap()
        .to_uppercase();
    for method in ["GET", "POST", "DELETE", "OPTIONS"] {
        assert!(allowed_methods.contains(method), "missing {method}");
    }
}

#[tokio::test]
async fn test_cors_on_responses() {
    let app = test_app();

    let response = app
        .send(
            Request::builder()
                .uri("/articles")
                .header(header::ORIGIN, "https://site.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_health_and_openapi() {
    let app = test_app();

    let response = app
        .send(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");

    let response = app
        .send(
            Request::builder()
                .uri("/api-doc/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["info"]["title"], "Newsdesk API");
}

#[tokio::test]
async fn test_unknown_article_detail() {
    let app = test_app();

    let response = app
        .send(
            Request::builder()
                .uri("/articles/news_1.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({"error": "article not found"})
    );
}
