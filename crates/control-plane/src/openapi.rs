// OpenAPI specification generation
//
// Served by the API server at /api-doc/openapi.json and printed by the
// export-openapi binary for static documentation builds.

use crate::api;
use crate::auth;
use newsdesk_core::{ArticleDetail, ArticleIndexEntry};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// OpenAPI documentation for the Newsdesk API
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::routes::login,
        api::articles::save_article,
        api::articles::delete_article,
        api::articles::list_articles,
        api::articles::get_article,
    ),
    components(
        schemas(
            auth::routes::LoginRequest,
            auth::routes::TokenResponse,
            api::ErrorResponse,
            api::OperationResponse,
            api::articles::SaveArticleForm,
            ArticleIndexEntry,
            ArticleDetail,
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "auth", description = "Publisher login"),
        (name = "articles", description = "Article publishing and index")
    ),
    info(
        title = "Newsdesk API",
        version = "0.1.0",
        description = "Authenticated article publishing backend",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme referenced by mutating routes
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

impl ApiDoc {
    /// Generate the OpenAPI spec as a pretty-printed JSON string
    pub fn to_json() -> serde_json::Result<String> {
        Self::openapi().to_pretty_json()
    }
}
