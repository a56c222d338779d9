mod preview;

use crate::AppState;
use axum::routing::post;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/import endpoints (mounted at /api/import)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(preview::preview_import))
        .route("/{token}/discard", post(preview::discard_import))
}

#[derive(OpenApi)]
#[openapi(
    paths(preview::preview_import, preview::discard_import),
    components(schemas(
        preview::ImportKindTag,
        preview::ImportRequest,
        preview::ImportResponse
    ))
)]
pub struct ApiDoc;
