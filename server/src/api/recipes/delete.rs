use crate::api::{warnings, ApiError, ErrorResponse, Warning};
use crate::auth::AuthUser;
use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};
use essensplan_core::ImportService;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteRecipeResponse {
    pub id: Uuid,
    /// Set when the image could not be removed from storage.
    pub warnings: Vec<Warning>,
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe deleted", body = DeleteRecipeResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_recipe(
    AuthUser(owner): AuthUser,
    State(imports): State<Arc<ImportService>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<DeleteRecipeResponse>, ApiError> {
    let Path(id) = id?;
    let deleted = imports.delete_recipe(owner, id).await?;

    Ok(Json(DeleteRecipeResponse {
        id: deleted.record.id,
        warnings: warnings(&deleted.warnings),
    }))
}
