// Article publishing HTTP routes
// Decision: Mutating routes require both a session token and the shared API key
// Decision: Reads are public; the index is what the public site renders

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        FromRef, Multipart, Path, Query, Request, State,
    },
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use newsdesk_core::{
    ArticleDetail, ArticleIndexEntry, ArticleRepository, ArticleSubmission, ImageUpload,
    NewsdeskError,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use super::common::{ErrorResponse, OperationError, OperationResponse};
use crate::auth::{ApiKeyGuard, AuthState, AuthUser};

/// App state for article routes
#[derive(Clone)]
pub struct ArticlesState {
    pub repository: Arc<ArticleRepository>,
    pub auth: AuthState,
    pub legacy_error_status: bool,
}

impl FromRef<ArticlesState> for AuthState {
    fn from_ref(input: &ArticlesState) -> Self {
        input.auth.clone()
    }
}

/// Multipart form accepted by `POST /save`
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct SaveArticleForm {
    /// JSON text with `title`, `subtitle`, `content`, `date` and any extra fields
    #[schema(example = r#"{"title":"A","subtitle":"s","content":"c","date":"2024-01-01"}"#)]
    pub data: String,
    /// Optional image file
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<Vec<u8>>,
}

/// Query parameters for deleting an article
#[derive(Debug, Deserialize, IntoParams)]
pub struct DeleteQuery {
    /// Index filename of the article, e.g. `news_20240101120000000000.json`
    pub filename: Option<String>,
}

/// Create article routes
pub fn routes(state: ArticlesState) -> Router {
    Router::new()
        .route("/save", post(save_article))
        .route("/delete", axum::routing::delete(delete_article))
        .route("/articles", get(list_articles))
        .route("/articles/:filename", get(get_article))
        .with_state(state)
}

/// POST /save - Publish an article with an optional image
#[utoipa::path(
    post,
    path = "/save",
    request_body(content = SaveArticleForm, content_type = "multipart/form-data"),
    params(
        ("X-API-KEY" = String, Header, description = "Shared API key")
    ),
    responses(
        (status = 200, description = "Article published", body = OperationResponse),
        (status = 400, description = "Malformed form data", body = OperationResponse),
        (status = 401, description = "Missing or invalid token or API key", body = ErrorResponse),
        (status = 413, description = "Upload exceeds the body limit", body = OperationResponse),
        (status = 500, description = "Storage failure", body = OperationResponse)
    ),
    security(("bearer" = [])),
    tag = "articles"
)]
pub async fn save_article(
    State(state): State<ArticlesState>,
    AuthUser(identity): AuthUser,
    _api_key: ApiKeyGuard,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> std::result::Result<Json<OperationResponse>, OperationError> {
    let fail = |e: NewsdeskError| OperationError::new(e, state.legacy_error_status);
    let reject = |e: FormError| fail(e.error).with_status(e.status);

    let multipart = multipart.map_err(|e| reject(e.into()))?;
    let (submission, image) = read_save_form(multipart).await.map_err(reject)?;

    let entry = state
        .repository
        .save(submission, image)
        .await
        .map_err(fail)?;

    tracing::info!(
        username = %identity.username,
        filename = %entry.filename,
        "Article published"
    );
    Ok(Json(OperationResponse::ok()))
}

/// A rejected upload form and the status to answer it with
struct FormError {
    error: NewsdeskError,
    status: StatusCode,
}

impl FormError {
    fn malformed(msg: impl Into<String>) -> Self {
        Self {
            error: NewsdeskError::malformed(msg),
            status: StatusCode::BAD_REQUEST,
        }
    }
}

// Body limit overruns surface here as 413
impl From<MultipartError> for FormError {
    fn from(e: MultipartError) -> Self {
        Self {
            error: NewsdeskError::malformed(e.body_text()),
            status: e.status(),
        }
    }
}

impl From<MultipartRejection> for FormError {
    fn from(e: MultipartRejection) -> Self {
        Self {
            error: NewsdeskError::malformed(e.body_text()),
            status: e.status(),
        }
    }
}

/// Collect the `data` JSON field and the optional `image` file
async fn read_save_form(
    mut multipart: Multipart,
) -> std::result::Result<(ArticleSubmission, Option<ImageUpload>), FormError> {
    let mut data = None;
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "data" => {
                data = Some(field.text().await?);
            }
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;

                // Browsers send an empty part when no file was chosen
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }

                let mut upload = ImageUpload::new(file_name, bytes.to_vec());
                if let Some(content_type) = content_type {
                    upload = upload.with_content_type(content_type);
                }
                image = Some(upload);
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unknown form field");
            }
        }
    }

    let raw = data.ok_or_else(|| FormError::malformed("missing data field"))?;
    let submission = ArticleSubmission::from_json(&raw)
        .map_err(|e| FormError::malformed(format!("invalid article data: {e}")))?;
    Ok((submission, image))
}

/// DELETE /delete - Remove an article and its objects
#[utoipa::path(
    delete,
    path = "/delete",
    params(
        DeleteQuery,
        ("X-API-KEY" = String, Header, description = "Shared API key")
    ),
    responses(
        (status = 200, description = "Article deleted", body = OperationResponse),
        (status = 400, description = "Missing filename", body = OperationResponse),
        (status = 401, description = "Missing or invalid token or API key", body = ErrorResponse),
        (status = 404, description = "Article not in the index", body = OperationResponse),
        (status = 500, description = "Storage failure", body = OperationResponse)
    ),
    security(("bearer" = [])),
    tag = "articles"
)]
pub async fn delete_article(
    State(state): State<ArticlesState>,
    AuthUser(identity): AuthUser,
    _api_key: ApiKeyGuard,
    Query(query): Query<DeleteQuery>,
) -> std::result::Result<Json<OperationResponse>, OperationError> {
    let fail = |e: NewsdeskError| OperationError::new(e, state.legacy_error_status);

    let filename = query
        .filename
        .filter(|f| !f.is_empty())
        .ok_or_else(|| fail(NewsdeskError::malformed("missing filename")))?;

    state.repository.delete(&filename).await.map_err(|e| {
        if matches!(e, NewsdeskError::NotFound(_)) {
            tracing::info!(filename = %filename, "Delete of unknown article");
        }
        fail(e)
    })?;

    tracing::info!(username = %identity.username, filename = %filename, "Article deleted");
    Ok(Json(OperationResponse::ok()))
}

/// Give `OPTIONS /delete` a `{"success": true}` body.
///
/// The CORS layer answers every OPTIONS request before routing, so this runs
/// outside it and keeps the CORS headers it produced.
pub async fn delete_preflight_body(req: Request, next: Next) -> Response {
    let delete_preflight = req.method() == Method::OPTIONS && req.uri().path() == "/delete";
    let response = next.run(req).await;
    if !delete_preflight || !response.status().is_success() {
        return response;
    }

    let (mut parts, _) = response.into_parts();
    let (json_parts, body) = Json(OperationResponse::ok()).into_response().into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    if let Some(content_type) = json_parts.headers.get(header::CONTENT_TYPE) {
        parts
            .headers
            .insert(header::CONTENT_TYPE, content_type.clone());
    }
    Response::from_parts(parts, body)
}

fn read_error(e: NewsdeskError) -> (StatusCode, Json<ErrorResponse>) {
    match e {
        NewsdeskError::NotFound(_) => {
            ErrorResponse::new("article not found").into_response(StatusCode::NOT_FOUND)
        }
        other => {
            tracing::error!("Failed to read articles: {}", other);
            ErrorResponse::new("storage failure").into_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /articles - The index document, newest first
#[utoipa::path(
    get,
    path = "/articles",
    responses(
        (status = 200, description = "Article index", body = Vec<ArticleIndexEntry>),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "articles"
)]
pub async fn list_articles(
    State(state): State<ArticlesState>,
) -> std::result::Result<Json<Vec<ArticleIndexEntry>>, (StatusCode, Json<ErrorResponse>)> {
    let index = state.repository.list().await.map_err(read_error)?;
    Ok(Json(index))
}

/// GET /articles/{filename} - Full stored article
#[utoipa::path(
    get,
    path = "/articles/{filename}",
    params(
        ("filename" = String, Path, description = "Index filename of the article")
    ),
    responses(
        (status = 200, description = "Article found", body = ArticleDetail),
        (status = 404, description = "Article not found", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "articles"
)]
pub async fn get_article(
    State(state): State<ArticlesState>,
    Path(filename): Path<String>,
) -> std::result::Result<Json<ArticleDetail>, (StatusCode, Json<ErrorResponse>)> {
    let detail = state.repository.get(&filename).await.map_err(read_error)?;
    Ok(Json(detail))
}
