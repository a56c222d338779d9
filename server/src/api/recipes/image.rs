//! Enhancement of a saved recipe's image. The generated candidate only
//! replaces the current image once confirmed.

use crate::api::{ApiError, ErrorResponse};
use crate::auth::AuthUser;
use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    Json,
};
use essensplan_core::{EnhancementWorkflow, StagingId};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementResponse {
    /// The candidate as a data URI.
    pub enhanced_image_data: String,
    #[schema(value_type = String, format = Uuid)]
    pub candidate_token: StagingId,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmEnhancementResponse {
    pub image_url: String,
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/image/enhance",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Enhanced candidate, not yet saved", body = EnhancementResponse),
        (status = 400, description = "Recipe has no image", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse),
        (status = 409, description = "Enhancement already running", body = ErrorResponse),
        (status = 500, description = "Image generation failed", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn enhance_recipe_image(
    AuthUser(owner): AuthUser,
    State(enhancements): State<Arc<EnhancementWorkflow>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<EnhancementResponse>, ApiError> {
    let Path(id) = id?;
    let candidate = enhancements.enhance_record(owner, id).await?;

    Ok(Json(EnhancementResponse {
        enhanced_image_data: candidate.pending.data_uri().encode(),
        candidate_token: candidate.pending.id(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/image/enhance/{token}/confirm",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID"),
        ("token" = Uuid, Path, description = "Candidate token")
    ),
    responses(
        (status = 200, description = "Candidate is now the recipe image", body = ConfirmEnhancementResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "No such candidate", body = ErrorResponse),
        (status = 500, description = "Image could not be saved", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn confirm_enhancement(
    AuthUser(owner): AuthUser,
    State(enhancements): State<Arc<EnhancementWorkflow>>,
    path: Result<Path<(Uuid, StagingId)>, PathRejection>,
) -> Result<Json<ConfirmEnhancementResponse>, ApiError> {
    let Path((id, token)) = path?;
    let record = enhancements.confirm(owner, id, token).await?;

    let image_url = record
        .image
        .map(|image| image.url().to_string())
        .unwrap_or_default();
    Ok(Json(ConfirmEnhancementResponse { image_url }))
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/image/enhance/{token}/decline",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID"),
        ("token" = Uuid, Path, description = "Candidate token")
    ),
    responses(
        (status = 204, description = "Candidate discarded"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "No such candidate", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn decline_enhancement(
    AuthUser(owner): AuthUser,
    State(enhancements): State<Arc<EnhancementWorkflow>>,
    path: Result<Path<(Uuid, StagingId)>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path((id, token)) = path?;
    enhancements.decline(owner, id, token)?;
    Ok(StatusCode::NO_CONTENT)
}
