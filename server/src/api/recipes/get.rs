use crate::api::{ApiError, ErrorResponse, Warning};
use crate::auth::AuthUser;
use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use essensplan_core::{ImportService, RecipeRecord, ValidatedRecipe};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeResponse {
    pub id: Uuid,
    #[schema(value_type = Object)]
    pub recipe: ValidatedRecipe,
    /// Public URL of the committed image.
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}

impl RecipeResponse {
    pub fn new(record: RecipeRecord, warnings: Vec<Warning>) -> Self {
        RecipeResponse {
            id: record.id,
            image_url: record.image.as_ref().map(|i| i.url().to_string()),
            recipe: record.recipe,
            created_at: record.created_at,
            updated_at: record.updated_at,
            warnings,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe details", body = RecipeResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_recipe(
    AuthUser(owner): AuthUser,
    State(imports): State<Arc<ImportService>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let Path(id) = id?;
    let record = imports.get_recipe(owner, id).await?;
    Ok(Json(RecipeResponse::new(record, Vec::new())))
}
