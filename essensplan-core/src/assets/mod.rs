//! Image asset lifecycle: ephemeral bytes, staged previews, committed
//! objects and orphans awaiting deletion.

mod config;
mod pipeline;
mod store;

pub use config::StorageConfig;
pub use pipeline::{AssetPipeline, ReplaceOutcome, StageSource};
pub use store::{LocalObjectStore, MemoryObjectStore, ObjectStore, StoreError};

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::source::DataUri;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Image could not be fetched: {0}")]
    Fetch(String),

    #[error("Invalid image: {0}")]
    Invalid(String),

    #[error("No staged image {0} for this account")]
    NotStaged(StagingId),

    #[error("Not a URL issued by this store: {0}")]
    ForeignUrl(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Image bytes that exist only in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct Ephemeral {
    pub bytes: Vec<u8>,
    /// Content type sniffed from the bytes.
    pub mime: String,
    /// Name of the uploaded file, if any. Never used for storage paths.
    pub origin_filename: Option<String>,
}

impl Ephemeral {
    pub fn to_data_uri(&self) -> DataUri {
        DataUri::new(self.mime.clone(), self.bytes.clone())
    }
}

impl fmt::Debug for Ephemeral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ephemeral")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .field("origin_filename", &self.origin_filename)
            .finish()
    }
}

/// Identifies a staged image within the pipeline's ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StagingId(Uuid);

impl StagingId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for StagingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for StagingId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// An ephemeral image the user has been shown and may confirm.
///
/// Only [`AssetPipeline::stage`] creates these, so every commit is backed by
/// something that went through staging.
#[derive(Debug, Clone)]
pub struct PendingAsset {
    id: StagingId,
    asset: Arc<Ephemeral>,
}

impl PendingAsset {
    pub fn id(&self) -> StagingId {
        self.id
    }

    pub fn asset(&self) -> &Ephemeral {
        &self.asset
    }

    pub fn data_uri(&self) -> DataUri {
        self.asset.to_data_uri()
    }
}

/// A durable object referenced by exactly one record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Committed {
    url: String,
}

impl Committed {
    /// Wrap a URL previously issued by [`ObjectStore::public_url`].
    pub fn from_url(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// A durable object nothing references any more, pending deletion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Orphaned {
    pub url: String,
}

/// An image in one of its lifecycle states.
#[derive(Debug, Clone)]
pub enum AssetHandle {
    Ephemeral(Arc<Ephemeral>),
    Committed(Committed),
    Orphaned(Orphaned),
}

impl AssetHandle {
    /// Whether the bytes live in durable storage.
    pub fn is_durable(&self) -> bool {
        !matches!(self, AssetHandle::Ephemeral(_))
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            AssetHandle::Ephemeral(_) => None,
            AssetHandle::Committed(c) => Some(c.url()),
            AssetHandle::Orphaned(o) => Some(&o.url),
        }
    }
}

impl From<PendingAsset> for AssetHandle {
    fn from(pending: PendingAsset) -> Self {
        AssetHandle::Ephemeral(pending.asset)
    }
}

impl From<Committed> for AssetHandle {
    fn from(committed: Committed) -> Self {
        AssetHandle::Committed(committed)
    }
}

impl From<Orphaned> for AssetHandle {
    fn from(orphaned: Orphaned) -> Self {
        AssetHandle::Orphaned(orphaned)
    }
}
