//! The import flow: preview a source, then save it on confirmation.
//!
//! Extraction and validation failures abort an import. Image failures only
//! cost the image: the recipe text is kept and the failure is reported as a
//! warning.

use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::ai::AiClient;
use crate::assets::{AssetError, AssetPipeline, PendingAsset, StageSource, StagingId};
use crate::error::ImportError;
use crate::extract::extract;
use crate::repository::{RecipeRecord, RecipeRepository, RepositoryError};
use crate::source::{normalize, DataUri, ImportSource, SourceSelection};
use crate::types::{RecipeDraft, ValidatedRecipe};
use crate::validate::validate;

/// What the user sees before deciding to save.
#[derive(Debug)]
pub struct ImportPreview {
    pub recipe: ValidatedRecipe,
    /// Staged image, fetched for locator imports or the input itself for
    /// image imports.
    pub image: Option<PendingAsset>,
    /// Non-fatal problems, e.g. the discovered photo could not be fetched.
    pub warnings: Vec<ImportError>,
}

/// A saved recipe plus anything that went wrong along the way without
/// preventing the save.
#[derive(Debug)]
pub struct SavedRecipe {
    pub record: RecipeRecord,
    pub warnings: Vec<ImportError>,
}

pub struct ImportService {
    ai: Arc<dyn AiClient>,
    assets: Arc<AssetPipeline>,
    repository: Arc<dyn RecipeRepository>,
}

impl ImportService {
    pub fn new(
        ai: Arc<dyn AiClient>,
        assets: Arc<AssetPipeline>,
        repository: Arc<dyn RecipeRepository>,
    ) -> Self {
        Self {
            ai,
            assets,
            repository,
        }
    }

    /// Normalize, extract, validate and stage the image. Nothing durable is
    /// written.
    pub async fn preview(
        &self,
        selection: SourceSelection,
        owner: Uuid,
    ) -> Result<ImportPreview, ImportError> {
        let source = normalize(selection, self.assets.max_image_bytes())?;
        let span = tracing::info_span!("import", owner = %owner, kind = ?source.kind());

        async move {
            let draft = extract(self.ai.as_ref(), &source).await?;
            let recipe = validate(&draft).map_err(ImportError::Validation)?;

            // Only stage once the recipe itself is known to be good
            let stage_source = match &source {
                ImportSource::Locator(_) => recipe.image_reference.clone().map(StageSource::Remote),
                ImportSource::Image {
                    image,
                    origin_filename,
                } => Some(StageSource::Upload {
                    bytes: image.data.clone(),
                    filename: origin_filename.clone(),
                }),
            };

            let mut warnings = Vec::new();
            let image = match stage_source {
                None => None,
                Some(stage_source) => match self.assets.stage(stage_source, owner).await {
                    Ok(pending) => Some(pending),
                    Err(e) => {
                        tracing::warn!(error = %e, "Continuing import without image");
                        warnings.push(ImportError::AssetFetch(e));
                        None
                    }
                },
            };

            tracing::info!(
                title = %recipe.title,
                has_image = image.is_some(),
                "Import preview ready"
            );
            Ok(ImportPreview {
                recipe,
                image,
                warnings,
            })
        }
        .instrument(span)
        .await
    }

    /// Discard a preview's staged image.
    pub fn discard(&self, image: StagingId, owner: Uuid) -> bool {
        self.assets.discard(image, owner)
    }

    /// Save a (possibly user-edited) draft and commit its staged image.
    ///
    /// The draft is validated again. If the image cannot be committed the
    /// recipe is saved without it. If the recipe cannot be saved, the
    /// just-committed image is deleted again.
    pub async fn confirm(
        &self,
        draft: &RecipeDraft,
        image: Option<StagingId>,
        owner: Uuid,
    ) -> Result<SavedRecipe, ImportError> {
        let mut recipe = validate(draft).map_err(ImportError::Validation)?;
        // The record's image is authoritative; remote references are not kept.
        recipe.image_reference = None;

        let mut warnings = Vec::new();
        let committed = match image {
            None => None,
            Some(id) => match self.assets.commit(id, owner).await {
                Ok(committed) => Some(committed),
                Err(e) => {
                    tracing::warn!(error = %e, "Saving recipe without image");
                    warnings.push(ImportError::AssetCommit(e));
                    None
                }
            },
        };

        let record = match self
            .repository
            .insert(owner, recipe, committed.clone())
            .await
        {
            Ok(record) => record,
            Err(e) => {
                if let Some(committed) = &committed {
                    if let Err(cleanup) = self.assets.retire(committed).await {
                        tracing::warn!(
                            url = %committed.url(),
                            error = %cleanup,
                            "Recipe not saved, its image is left for the orphan sweep"
                        );
                    }
                }
                return Err(e.into());
            }
        };

        tracing::info!(record_id = %record.id, owner = %owner, "Recipe saved");
        Ok(SavedRecipe { record, warnings })
    }

    pub async fn get_recipe(&self, owner: Uuid, id: Uuid) -> Result<RecipeRecord, ImportError> {
        Ok(self.repository.get(owner, id).await?)
    }

    /// Delete a record and its image. A failed image deletion is reported as
    /// a warning and the object is kept for the orphan sweep.
    pub async fn delete_recipe(&self, owner: Uuid, id: Uuid) -> Result<SavedRecipe, ImportError> {
        let record = self.repository.delete(owner, id).await?;

        let mut warnings = Vec::new();
        if let Some(image) = &record.image {
            if let Err(e) = self.assets.retire(image).await {
                warnings.push(ImportError::AssetCleanup {
                    url: image.url().to_string(),
                    source: e,
                });
            }
        }

        tracing::info!(record_id = %id, "Recipe deleted");
        Ok(SavedRecipe { record, warnings })
    }

    /// Replace a saved recipe's image with one supplied by the user.
    ///
    /// The new object is committed and referenced before the old one is
    /// deleted. A failed deletion is reported as a warning.
    pub async fn replace_image(
        &self,
        owner: Uuid,
        id: Uuid,
        image: DataUri,
    ) -> Result<SavedRecipe, ImportError> {
        let record = self.repository.get(owner, id).await?;
        let pending = self
            .assets
            .stage(StageSource::DataUri(image), owner)
            .await
            .map_err(ImportError::AssetFetch)?;

        let repository = &self.repository;
        let result = self
            .assets
            .replace(record.image.as_ref(), pending.id(), owner, |committed| async move {
                repository
                    .set_image(owner, id, Some(committed))
                    .await
                    .map(|_| ())
                    .map_err(ReplaceFailure::Repository)
            })
            .await;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                self.assets.discard(pending.id(), owner);
                return Err(e.into());
            }
        };

        let mut warnings = Vec::new();
        if let Some((orphan, source)) = outcome.orphaned {
            warnings.push(ImportError::AssetCleanup {
                url: orphan.url,
                source,
            });
        }

        tracing::info!(record_id = %id, url = %outcome.committed.url(), "Recipe image replaced");
        Ok(SavedRecipe {
            record: RecipeRecord {
                image: Some(outcome.committed),
                ..record
            },
            warnings,
        })
    }

    /// Clear a saved recipe's image and delete the object. A record without
    /// an image is returned unchanged.
    pub async fn remove_image(&self, owner: Uuid, id: Uuid) -> Result<SavedRecipe, ImportError> {
        let record = self.repository.get(owner, id).await?;
        let Some(old) = record.image.clone() else {
            return Ok(SavedRecipe {
                record,
                warnings: Vec::new(),
            });
        };

        let record = self.repository.set_image(owner, id, None).await?;

        let mut warnings = Vec::new();
        if let Err(e) = self.assets.retire(&old).await {
            warnings.push(ImportError::AssetCleanup {
                url: old.url().to_string(),
                source: e,
            });
        }

        tracing::info!(record_id = %id, "Recipe image removed");
        Ok(SavedRecipe { record, warnings })
    }

    pub fn assets(&self) -> &Arc<AssetPipeline> {
        &self.assets
    }
}

/// Why swapping in a replacement image failed.
enum ReplaceFailure {
    Asset(AssetError),
    Repository(RepositoryError),
}

impl From<AssetError> for ReplaceFailure {
    fn from(error: AssetError) -> Self {
        ReplaceFailure::Asset(error)
    }
}

impl From<ReplaceFailure> for ImportError {
    fn from(failure: ReplaceFailure) -> Self {
        match failure {
            ReplaceFailure::Asset(e) => ImportError::AssetCommit(e),
            ReplaceFailure::Repository(e) => ImportError::Repository(e),
        }
    }
}
