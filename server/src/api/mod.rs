pub mod enhance;
mod error;
pub mod import;
pub mod recipes;

pub use error::{warnings, ApiError, ErrorBody, ErrorResponse, Warning};

use crate::AppState;
use axum::Router;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

/// Routes under /api, all requiring a bearer token.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/api/import", import::router())
        .nest("/api/recipes", recipes::router())
        .nest("/api/enhance", enhance::router())
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    #[derive(OpenApi)]
    #[openapi(
        info(title = "Essensplan API", description = "AI-assisted recipe import"),
        components(schemas(ErrorResponse, ErrorBody, Warning))
    )]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    if let Some(components) = spec.components.as_mut() {
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }

    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        import::ApiDoc::openapi(),
        recipes::ApiDoc::openapi(),
        enhance::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        spec.paths.paths.extend(module_spec.paths.paths);

        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}
