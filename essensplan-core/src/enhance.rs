//! Image enhancement: re-render a recipe photo and let the user decide
//! whether to keep it.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use dashmap::{DashMap, DashSet};
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use crate::ai::prompts::{
    render_enhance_instructions, render_enhance_prompt, IMAGE_ENHANCE_PROMPT_NAME,
};
use crate::ai::{AiClient, AiError, AiRequest, Tool};
use crate::assets::{AssetError, AssetPipeline, PendingAsset, StageSource, StagingId};
use crate::repository::{RecipeRecord, RecipeRepository, RepositoryError};
use crate::source::DataUri;
use crate::types::ValidatedRecipe;

/// Generated images are returned as JPEG.
const ENHANCED_MIME: &str = "image/jpeg";

#[derive(Error, Debug)]
pub enum EnhanceError {
    #[error("An enhancement for recipe {0} is already running")]
    InFlight(Uuid),

    #[error("Recipe {0} has no image to enhance")]
    NoImageOnRecord(Uuid),

    #[error("Image generation returned no image")]
    NoImage,

    #[error("No enhancement candidate {0} for this recipe")]
    CandidateNotFound(StagingId),

    #[error("Image generation failed: {0}")]
    Capability(#[from] AiError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Optional context sent along with the image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnhancementHints {
    pub title: Option<String>,
    pub ingredients: Vec<String>,
}

impl EnhancementHints {
    pub fn from_recipe(recipe: &ValidatedRecipe) -> Self {
        Self {
            title: Some(recipe.title.clone()),
            ingredients: recipe.ingredient_names(),
        }
    }
}

/// Ask the capability for a re-rendered variant of `image`.
pub async fn enhance_image(
    ai: &dyn AiClient,
    image: &DataUri,
    hints: &EnhancementHints,
) -> Result<DataUri, EnhanceError> {
    let span = tracing::info_span!("enhance", mime = %image.mime, size = image.data.len());

    async move {
        let request = AiRequest::new(render_enhance_instructions())
            .with_text(render_enhance_prompt(
                hints.title.as_deref(),
                &hints.ingredients,
            ))
            .with_image(image.encode())
            .with_tool(Tool::ImageGeneration);

        let response = ai.complete(IMAGE_ENHANCE_PROMPT_NAME, request).await?;
        let encoded = response
            .images
            .into_iter()
            .find(|data| !data.trim().is_empty())
            .ok_or(EnhanceError::NoImage)?;

        let data = BASE64.decode(encoded.trim()).map_err(|e| {
            AiError::ParseError(format!("generated image is not valid base64: {}", e))
        })?;

        tracing::info!(size = data.len(), "Enhanced image generated");
        Ok(DataUri::new(ENHANCED_MIME, data))
    }
    .instrument(span)
    .await
}

/// Allows at most one enhancement per record at a time.
#[derive(Debug, Default)]
pub struct EnhancementGuard {
    in_flight: DashSet<Uuid>,
}

/// Held while an enhancement runs; releases the record on drop.
#[derive(Debug)]
pub struct EnhancementPermit<'a> {
    guard: &'a EnhancementGuard,
    record_id: Uuid,
}

impl EnhancementGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails fast instead of queueing when the record is busy.
    pub fn try_acquire(&self, record_id: Uuid) -> Result<EnhancementPermit<'_>, EnhanceError> {
        if self.in_flight.insert(record_id) {
            Ok(EnhancementPermit {
                guard: self,
                record_id,
            })
        } else {
            Err(EnhanceError::InFlight(record_id))
        }
    }

    pub fn is_in_flight(&self, record_id: Uuid) -> bool {
        self.in_flight.contains(&record_id)
    }
}

impl Drop for EnhancementPermit<'_> {
    fn drop(&mut self) {
        self.guard.in_flight.remove(&self.record_id);
    }
}

/// A generated image waiting for the user's decision.
#[derive(Debug, Clone)]
pub struct EnhancementCandidate {
    pub record_id: Uuid,
    pub pending: PendingAsset,
}

/// Enhancement of a saved recipe's image, gated by explicit confirmation.
pub struct EnhancementWorkflow {
    ai: Arc<dyn AiClient>,
    assets: Arc<AssetPipeline>,
    repository: Arc<dyn RecipeRepository>,
    guard: EnhancementGuard,
    candidates: DashMap<StagingId, CandidateOwner>,
}

/// Who a staged candidate belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CandidateOwner {
    owner: Uuid,
    record_id: Uuid,
}

impl EnhancementWorkflow {
    pub fn new(
        ai: Arc<dyn AiClient>,
        assets: Arc<AssetPipeline>,
        repository: Arc<dyn RecipeRepository>,
    ) -> Self {
        Self {
            ai,
            assets,
            repository,
            guard: EnhancementGuard::new(),
            candidates: DashMap::new(),
        }
    }

    pub fn guard(&self) -> &EnhancementGuard {
        &self.guard
    }

    /// Generate a candidate for the record's committed image. Nothing is
    /// written to storage.
    pub async fn enhance_record(
        &self,
        owner: Uuid,
        record_id: Uuid,
    ) -> Result<EnhancementCandidate, EnhanceError> {
        let _permit = self.guard.try_acquire(record_id)?;

        let record = self.repository.get(owner, record_id).await?;
        let image = record
            .image
            .as_ref()
            .ok_or(EnhanceError::NoImageOnRecord(record_id))?;

        let original = self.assets.load(image).await?;
        let hints = EnhancementHints::from_recipe(&record.recipe);
        let enhanced = enhance_image(self.ai.as_ref(), &original, &hints).await?;

        let pending = self
            .assets
            .stage(StageSource::DataUri(enhanced), owner)
            .await?;
        self.candidates
            .insert(pending.id(), CandidateOwner { owner, record_id });

        tracing::info!(record_id = %record_id, candidate = %pending.id(), "Enhancement candidate ready");
        Ok(EnhancementCandidate { record_id, pending })
    }

    fn take_candidate(
        &self,
        owner: Uuid,
        record_id: Uuid,
        token: StagingId,
    ) -> Result<(), EnhanceError> {
        let expected = CandidateOwner { owner, record_id };
        self.candidates
            .remove_if(&token, |_, c| *c == expected)
            .map(|_| ())
            .ok_or(EnhanceError::CandidateNotFound(token))
    }

    /// Number of candidates awaiting a decision.
    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Forget candidates whose staged image has expired or been discarded.
    /// Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let before = self.candidates.len();
        self.candidates
            .retain(|token, c| self.assets.preview(*token, c.owner).is_some());
        let dropped = before.saturating_sub(self.candidates.len());
        if dropped > 0 {
            tracing::debug!(dropped, "Dropped expired enhancement candidates");
        }
        dropped
    }

    /// Promote the candidate to the record's image, replacing the old one.
    pub async fn confirm(
        &self,
        owner: Uuid,
        record_id: Uuid,
        token: StagingId,
    ) -> Result<RecipeRecord, EnhanceError> {
        self.take_candidate(owner, record_id, token)?;
        let record = match self.repository.get(owner, record_id).await {
            Ok(record) => record,
            Err(e) => {
                self.assets.discard(token, owner);
                return Err(e.into());
            }
        };

        let repository = &self.repository;
        let result = self
            .assets
            .replace(record.image.as_ref(), token, owner, |committed| async move {
                repository
                    .set_image(owner, record_id, Some(committed))
                    .await
                    .map(|_| ())
                    .map_err(EnhanceError::from)
            })
            .await;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                // A failed upload leaves the candidate staged; keep it confirmable.
                if self.assets.preview(token, owner).is_some() {
                    self.candidates
                        .insert(token, CandidateOwner { owner, record_id });
                }
                return Err(e);
            }
        };

        tracing::info!(
            record_id = %record_id,
            url = %outcome.committed.url(),
            "Enhanced image confirmed"
        );

        Ok(RecipeRecord {
            image: Some(outcome.committed),
            ..record
        })
    }

    /// Drop the candidate. The record and storage are untouched.
    pub fn decline(
        &self,
        owner: Uuid,
        record_id: Uuid,
        token: StagingId,
    ) -> Result<(), EnhanceError> {
        self.take_candidate(owner, record_id, token)?;
        self.assets.discard(token, owner);
        tracing::debug!(record_id = %record_id, candidate = %token, "Enhancement declined");
        Ok(())
    }
}
