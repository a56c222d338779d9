use crate::api::{warnings, ApiError, ErrorResponse, Warning};
use crate::auth::AuthUser;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use essensplan_core::{ImportKind, ImportPreview, ImportService, SourceSelection, StagingId, ValidatedRecipe};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Import source tag. `url` and `screenshot` are accepted as aliases of
/// `locator` and `image`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImportKindTag {
    Locator,
    Image,
}

impl From<ImportKind> for ImportKindTag {
    fn from(kind: ImportKind) -> Self {
        match kind {
            ImportKind::Locator => ImportKindTag::Locator,
            ImportKind::Image => ImportKindTag::Image,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ImportRequest {
    /// `locator` for a web page, `image` for a photo or screenshot.
    #[schema(value_type = ImportKindTag, example = "locator")]
    pub kind: ImportKind,
    /// The page URL, or the image as a base64 data URI.
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    /// Canonical tag of the requested source.
    pub kind: ImportKindTag,
    #[schema(value_type = Object)]
    pub recipe: ValidatedRecipe,
    /// Staged image as a data URI, for display before saving.
    pub image: Option<String>,
    /// Pass to `POST /api/recipes` to keep the image.
    #[schema(value_type = Option<String>, format = Uuid)]
    pub image_token: Option<StagingId>,
    pub warnings: Vec<Warning>,
}

impl ImportResponse {
    fn new(kind: ImportKind, preview: ImportPreview) -> Self {
        ImportResponse {
            kind: kind.into(),
            warnings: warnings(&preview.warnings),
            image: preview.image.as_ref().map(|p| p.data_uri().encode()),
            image_token: preview.image.as_ref().map(|p| p.id()),
            recipe: preview.recipe,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/import",
    tag = "import",
    request_body = ImportRequest,
    responses(
        (status = 200, description = "Extracted recipe, not yet saved", body = ImportResponse),
        (status = 400, description = "Invalid request or recipe", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Extraction failed", body = ErrorResponse),
        (status = 503, description = "AI capability not configured", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn preview_import(
    AuthUser(owner): AuthUser,
    State(imports): State<Arc<ImportService>>,
    payload: Result<Json<ImportRequest>, JsonRejection>,
) -> Result<Json<ImportResponse>, ApiError> {
    let Json(request) = payload?;
    let content = request
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ApiError::missing_field("content"))?;

    let preview = imports
        .preview(SourceSelection::from_wire(request.kind, content), owner)
        .await?;

    Ok(Json(ImportResponse::new(request.kind, preview)))
}

#[utoipa::path(
    post,
    path = "/api/import/{token}/discard",
    tag = "import",
    params(
        ("token" = Uuid, Path, description = "Image token from the preview")
    ),
    responses(
        (status = 204, description = "Staged image discarded"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "No such staged image", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn discard_import(
    AuthUser(owner): AuthUser,
    State(imports): State<Arc<ImportService>>,
    token: Result<Path<StagingId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(token) = token?;
    if imports.discard(token, owner) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Staged image not found"))
    }
}
