//! AI-assisted recipe import.
//!
//! A source (web link or photo) is normalized, handed to an extraction
//! capability, validated against the recipe schema and previewed together
//! with a staged image. Images only reach durable storage once the user
//! confirms, and replacing an image commits the new object before the old
//! one is deleted.

pub mod ai;
pub mod assets;
pub mod enhance;
pub mod error;
pub mod extract;
pub mod http;
pub mod image;
pub mod import;
pub mod repository;
pub mod source;
pub mod types;
pub mod validate;

pub use ai::{AiClient, AiConfig, AiError, FakeAiClient, FakeReply, OpenAiClient};
pub use assets::{
    AssetError, AssetHandle, AssetPipeline, Committed, Ephemeral, LocalObjectStore,
    MemoryObjectStore, ObjectStore, Orphaned, PendingAsset, ReplaceOutcome, StageSource,
    StagingId, StorageConfig,
};
pub use enhance::{
    enhance_image, EnhanceError, EnhancementCandidate, EnhancementGuard, EnhancementHints,
    EnhancementWorkflow,
};
pub use error::{ExtractError, FetchError, ImportError, ValidationError};
pub use extract::{extract, recipe_schema};
pub use http::{HttpClient, MockClient, MockResponse, WebClient};
pub use image::{fetch_and_validate_image, validate_image, FetchedImage, DEFAULT_MAX_IMAGE_BYTES};
pub use import::{ImportPreview, ImportService, SavedRecipe};
pub use repository::{MemoryRecipeRepository, RecipeRecord, RecipeRepository, RepositoryError};
pub use source::{normalize, DataUri, ImportKind, ImportSource, SourceSelection};
pub use types::{
    Category, Difficulty, Ingredient, IngredientGroup, Instruction, RecipeDraft, Tag,
    ValidatedRecipe,
};
pub use validate::validate;
