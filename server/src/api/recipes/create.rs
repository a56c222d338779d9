use crate::api::{warnings, ApiError, ErrorResponse};
use crate::auth::AuthUser;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use essensplan_core::{ImportService, RecipeDraft, StagingId};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::get::RecipeResponse;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecipeRequest {
    /// The previewed recipe, possibly edited by the user.
    #[schema(value_type = Object)]
    pub recipe: RecipeDraft,
    /// Image token from the import preview.
    #[serde(default)]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub image_token: Option<StagingId>,
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body = CreateRecipeRequest,
    responses(
        (status = 201, description = "Recipe saved", body = RecipeResponse),
        (status = 400, description = "Invalid recipe", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 503, description = "Recipe storage unavailable", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_recipe(
    AuthUser(owner): AuthUser,
    State(imports): State<Arc<ImportService>>,
    payload: Result<Json<CreateRecipeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RecipeResponse>), ApiError> {
    let Json(request) = payload?;

    let saved = imports
        .confirm(&request.recipe, request.image_token, owner)
        .await?;

    let warnings = warnings(&saved.warnings);
    Ok((
        StatusCode::CREATED,
        Json(RecipeResponse::new(saved.record, warnings)),
    ))
}
