//! Direct replacement or removal of a saved recipe's image.

use super::get::RecipeResponse;
use crate::api::{warnings, ApiError, ErrorResponse};
use crate::auth::AuthUser;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use essensplan_core::{DataUri, ImportService};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceImageRequest {
    /// The new image as a base64 data URI.
    #[serde(default)]
    pub base64_image_data: Option<String>,
}

#[utoipa::path(
    put,
    path = "/api/recipes/{id}/image",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    request_body = ReplaceImageRequest,
    responses(
        (status = 200, description = "Image replaced; warnings report a stale image left behind", body = RecipeResponse),
        (status = 400, description = "Missing or invalid image", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse),
        (status = 500, description = "Image could not be saved", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn replace_recipe_image(
    AuthUser(owner): AuthUser,
    State(imports): State<Arc<ImportService>>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ReplaceImageRequest>, JsonRejection>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let raw = request
        .base64_image_data
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ApiError::missing_field("base64ImageData"))?;
    let image = DataUri::parse(&raw)?;

    let saved = imports.replace_image(owner, id, image).await?;
    Ok(Json(RecipeResponse::new(
        saved.record,
        warnings(&saved.warnings),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/image",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Image removed", body = RecipeResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn remove_recipe_image(
    AuthUser(owner): AuthUser,
    State(imports): State<Arc<ImportService>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let Path(id) = id?;
    let saved = imports.remove_image(owner, id).await?;
    Ok(Json(RecipeResponse::new(
        saved.record,
        warnings(&saved.warnings),
    )))
}
