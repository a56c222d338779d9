pub mod create;
pub mod delete;
pub mod get;
pub mod image;
pub mod upload;

use crate::AppState;
use axum::routing::{get, post, put};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/recipes endpoints (mounted at /api/recipes)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create::create_recipe))
        .route("/{id}", get(get::get_recipe).delete(delete::delete_recipe))
        .route(
            "/{id}/image",
            put(upload::replace_recipe_image).delete(upload::remove_recipe_image),
        )
        .route("/{id}/image/enhance", post(image::enhance_recipe_image))
        .route(
            "/{id}/image/enhance/{token}/confirm",
            post(image::confirm_enhancement),
        )
        .route(
            "/{id}/image/enhance/{token}/decline",
            post(image::decline_enhancement),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create::create_recipe,
        get::get_recipe,
        delete::delete_recipe,
        upload::replace_recipe_image,
        upload::remove_recipe_image,
        image::enhance_recipe_image,
        image::confirm_enhancement,
        image::decline_enhancement,
    ),
    components(schemas(
        create::CreateRecipeRequest,
        get::RecipeResponse,
        delete::DeleteRecipeResponse,
        upload::ReplaceImageRequest,
        image::EnhancementResponse,
        image::ConfirmEnhancementResponse,
    ))
)]
pub struct ApiDoc;
