//! Stateless image enhancement: the caller sends an image and gets a
//! re-rendered one back. Nothing is staged or stored.

use crate::api::{ApiError, ErrorResponse};
use crate::auth::AuthUser;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use essensplan_core::{
    enhance_image, validate_image, AiClient, DataUri, EnhancementHints, ImportService,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

/// Returns the router for /api/enhance (mounted at /api/enhance)
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(enhance))
}

#[derive(OpenApi)]
#[openapi(
    paths(enhance),
    components(schemas(EnhanceRequest, EnhanceResponse))
)]
pub struct ApiDoc;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceRequest {
    /// Image as a base64 data URI.
    #[serde(default)]
    pub base64_image_data: Option<String>,
    #[serde(default)]
    pub recipe_title: Option<String>,
    #[serde(default)]
    pub ingredients: Option<Vec<String>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceResponse {
    /// Enhanced image as a data URI.
    pub enhanced_image_data: String,
}

#[utoipa::path(
    post,
    path = "/api/enhance",
    tag = "enhance",
    request_body = EnhanceRequest,
    responses(
        (status = 200, description = "Enhanced image", body = EnhanceResponse),
        (status = 400, description = "Missing or invalid image", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Image generation failed", body = ErrorResponse),
        (status = 503, description = "AI capability not configured", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn enhance(
    AuthUser(_user): AuthUser,
    State(ai): State<Arc<dyn AiClient>>,
    State(imports): State<Arc<ImportService>>,
    payload: Result<Json<EnhanceRequest>, JsonRejection>,
) -> Result<Json<EnhanceResponse>, ApiError> {
    let Json(request) = payload?;
    let raw = request
        .base64_image_data
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ApiError::missing_field("base64ImageData"))?;

    let parsed = DataUri::parse(&raw)?;
    let mime = validate_image(&parsed.data, imports.assets().max_image_bytes())
        .map_err(|e| ApiError::invalid_request(e.to_string()))?;
    let image = DataUri::new(mime, parsed.data);

    let hints = EnhancementHints {
        title: request.recipe_title,
        ingredients: request.ingredients.unwrap_or_default(),
    };

    let enhanced = enhance_image(ai.as_ref(), &image, &hints).await?;
    Ok(Json(EnhanceResponse {
        enhanced_image_data: enhanced.encode(),
    }))
}
