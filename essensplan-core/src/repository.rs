//! Recipe record storage contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use uuid::Uuid;

use crate::assets::Committed;
use crate::types::ValidatedRecipe;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Recipe not found: {0}")]
    NotFound(Uuid),

    #[error("Recipe storage unavailable: {0}")]
    Unavailable(String),
}

/// A persisted recipe. The committed image is held apart from the recipe
/// body so a record can never point at more than one image.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeRecord {
    pub id: Uuid,
    pub owner: Uuid,
    pub recipe: ValidatedRecipe,
    pub image: Option<Committed>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait RecipeRepository: Send + Sync {
    async fn insert(
        &self,
        owner: Uuid,
        recipe: ValidatedRecipe,
        image: Option<Committed>,
    ) -> Result<RecipeRecord, RepositoryError>;

    /// Records are only visible to their owner.
    async fn get(&self, owner: Uuid, id: Uuid) -> Result<RecipeRecord, RepositoryError>;

    /// Point the record at a new image, returning the updated record.
    async fn set_image(
        &self,
        owner: Uuid,
        id: Uuid,
        image: Option<Committed>,
    ) -> Result<RecipeRecord, RepositoryError>;

    /// Remove the record, returning it.
    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<RecipeRecord, RepositoryError>;
}

/// In-memory repository.
#[derive(Default)]
pub struct MemoryRecipeRepository {
    records: DashMap<Uuid, RecipeRecord>,
    unavailable: AtomicBool,
}

impl MemoryRecipeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with [`RepositoryError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(RepositoryError::Unavailable("repository offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecipeRepository for MemoryRecipeRepository {
    async fn insert(
        &self,
        owner: Uuid,
        recipe: ValidatedRecipe,
        image: Option<Committed>,
    ) -> Result<RecipeRecord, RepositoryError> {
        self.check_available()?;
        let now = Utc::now();
        let record = RecipeRecord {
            id: Uuid::new_v4(),
            owner,
            recipe,
            image,
            created_at: now,
            updated_at: now,
        };
        self.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<RecipeRecord, RepositoryError> {
        self.check_available()?;
        self.records
            .get(&id)
            .filter(|r| r.owner == owner)
            .map(|r| r.clone())
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn set_image(
        &self,
        owner: Uuid,
        id: Uuid,
        image: Option<Committed>,
    ) -> Result<RecipeRecord, RepositoryError> {
        self.check_available()?;
        let mut record = self
            .records
            .get_mut(&id)
            .filter(|r| r.owner == owner)
            .ok_or(RepositoryError::NotFound(id))?;
        record.image = image;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<RecipeRecord, RepositoryError> {
        self.check_available()?;
        self.records
            .remove_if(&id, |_, r| r.owner == owner)
            .map(|(_, r)| r)
            .ok_or(RepositoryError::NotFound(id))
    }
}
