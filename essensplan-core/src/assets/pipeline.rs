//! Staging, commit and replacement of recipe images.
//!
//! Images are staged in memory when a preview is shown and only reach the
//! object store once the user confirms. Replacement commits the new object
//! before deleting the old one; deletions that fail are kept as orphans for
//! a later sweep.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::{DashMap, DashSet};
use tracing::Instrument;
use uuid::Uuid;

use super::store::ObjectStore;
use super::{AssetError, Committed, Ephemeral, Orphaned, PendingAsset, StagingId};
use crate::http::HttpClient;
use crate::image::{extension_for, fetch_and_validate_image, validate_image, ImageError};
use crate::source::{DataUri, DEFAULT_IMAGE_MIME};

/// Where a staged image comes from.
#[derive(Debug, Clone)]
pub enum StageSource {
    /// Raw bytes uploaded by the user.
    Upload {
        bytes: Vec<u8>,
        filename: Option<String>,
    },
    /// Bytes already held as a data URI (image imports, enhancement results).
    DataUri(DataUri),
    /// A remote image, downloaded completely before it is accepted.
    Remote(String),
}

/// Result of a replacement.
#[derive(Debug)]
pub struct ReplaceOutcome {
    /// The handle the record must now reference.
    pub committed: Committed,
    /// The previous object and the deletion error, if deleting it failed.
    pub orphaned: Option<(Orphaned, AssetError)>,
}

struct StagedEntry {
    owner: Uuid,
    asset: Arc<Ephemeral>,
    staged_at: Instant,
}

pub struct AssetPipeline {
    store: Arc<dyn ObjectStore>,
    http: Arc<dyn HttpClient>,
    max_image_bytes: usize,
    staging_ttl: Duration,
    staged: DashMap<StagingId, StagedEntry>,
    orphans: DashSet<String>,
}

impl AssetPipeline {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        http: Arc<dyn HttpClient>,
        max_image_bytes: usize,
        staging_ttl: Duration,
    ) -> Self {
        Self {
            store,
            http,
            max_image_bytes,
            staging_ttl,
            staged: DashMap::new(),
            orphans: DashSet::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn max_image_bytes(&self) -> usize {
        self.max_image_bytes
    }

    /// Bring an image into memory, validate it and record it for `owner`.
    ///
    /// Nothing is written to durable storage.
    pub async fn stage(
        &self,
        source: StageSource,
        owner: Uuid,
    ) -> Result<PendingAsset, AssetError> {
        let span = tracing::info_span!("stage", owner = %owner);

        async move {
            let asset = match source {
                StageSource::Upload { bytes, filename } => {
                    let mime = self.sniff(&bytes)?;
                    Ephemeral {
                        bytes,
                        mime,
                        origin_filename: filename,
                    }
                }
                StageSource::DataUri(uri) => {
                    let mime = self.sniff(&uri.data)?;
                    Ephemeral {
                        bytes: uri.data,
                        mime,
                        origin_filename: None,
                    }
                }
                StageSource::Remote(url) => {
                    let fetched =
                        fetch_and_validate_image(self.http.as_ref(), &url, self.max_image_bytes)
                            .await
                            .map_err(|e| match e {
                                ImageError::Fetch(e) => AssetError::Fetch(e.to_string()),
                                other => AssetError::Invalid(other.to_string()),
                            })?;
                    Ephemeral {
                        bytes: fetched.data,
                        mime: fetched.content_type,
                        origin_filename: None,
                    }
                }
            };

            let pending = PendingAsset {
                id: StagingId::new(),
                asset: Arc::new(asset),
            };
            self.staged.insert(
                pending.id,
                StagedEntry {
                    owner,
                    asset: Arc::clone(&pending.asset),
                    staged_at: Instant::now(),
                },
            );

            tracing::debug!(
                id = %pending.id,
                mime = %pending.asset.mime,
                size = pending.asset.bytes.len(),
                "Staged image"
            );
            Ok(pending)
        }
        .instrument(span)
        .await
    }

    fn sniff(&self, bytes: &[u8]) -> Result<String, AssetError> {
        validate_image(bytes, self.max_image_bytes).map_err(|e| AssetError::Invalid(e.to_string()))
    }

    /// The staged image behind `id`, if it is still pending for `owner`.
    pub fn preview(&self, id: StagingId, owner: Uuid) -> Option<Arc<Ephemeral>> {
        self.staged
            .get(&id)
            .filter(|e| e.owner == owner && !self.is_expired(e.value()))
            .map(|e| Arc::clone(&e.asset))
    }

    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }

    fn is_expired(&self, entry: &StagedEntry) -> bool {
        entry.staged_at.elapsed() >= self.staging_ttl
    }

    /// Remove a ledger entry owned by `owner`. Expired entries are dropped
    /// and reported as not staged.
    fn take_staged(&self, id: StagingId, owner: Uuid) -> Result<StagedEntry, AssetError> {
        let (_, entry) = self
            .staged
            .remove_if(&id, |_, e| e.owner == owner)
            .ok_or(AssetError::NotStaged(id))?;

        if self.is_expired(&entry) {
            tracing::debug!(id = %id, "Staged image expired");
            return Err(AssetError::NotStaged(id));
        }
        Ok(entry)
    }

    /// Upload a staged image to durable storage under the owner's namespace.
    ///
    /// Consumes the staging entry. If the upload fails the entry is restored
    /// so the user can try again.
    pub async fn commit(&self, id: StagingId, owner: Uuid) -> Result<Committed, AssetError> {
        let span = tracing::info_span!("commit", owner = %owner, id = %id);

        async move {
            let entry = self.take_staged(id, owner)?;
            let path = object_path(owner, &entry.asset.mime);

            if let Err(e) = self
                .store
                .put(&path, &entry.asset.bytes, &entry.asset.mime)
                .await
            {
                tracing::warn!(path = %path, error = %e, "Failed to commit image");
                self.staged.insert(id, entry);
                return Err(e.into());
            }

            let committed = Committed::from_url(self.store.public_url(&path));
            tracing::info!(url = %committed.url(), "Committed image");
            Ok(committed)
        }
        .instrument(span)
        .await
    }

    /// Commit `id`, let `swap` point the owning record at it, then retire
    /// `old`.
    ///
    /// A failed commit leaves `old` untouched. A failed swap deletes the new
    /// object again and leaves `old` in place. A failed deletion of `old`
    /// does not fail the replacement; the object is kept as an orphan.
    pub async fn replace<F, Fut, E>(
        &self,
        old: Option<&Committed>,
        id: StagingId,
        owner: Uuid,
        swap: F,
    ) -> Result<ReplaceOutcome, E>
    where
        F: FnOnce(Committed) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: From<AssetError>,
    {
        let span = tracing::info_span!("replace", owner = %owner, id = %id);

        async move {
            let committed = self.commit(id, owner).await?;

            if let Err(e) = swap(committed.clone()).await {
                tracing::warn!(url = %committed.url(), "Reference swap failed, removing new image");
                let _ = self.retire(&committed).await;
                return Err(e);
            }

            let orphaned = match old {
                Some(old) if old != &committed => self.retire(old).await.err().map(|e| {
                    let orphan = Orphaned {
                        url: old.url().to_string(),
                    };
                    (orphan, e)
                }),
                _ => None,
            };

            tracing::info!(
                new = %committed.url(),
                old = old.map(Committed::url).unwrap_or(""),
                orphaned = orphaned.is_some(),
                "Replaced image"
            );
            Ok(ReplaceOutcome {
                committed,
                orphaned,
            })
        }
        .instrument(span)
        .await
    }

    /// Drop a staged image. No storage side effects.
    pub fn discard(&self, id: StagingId, owner: Uuid) -> bool {
        let removed = self.staged.remove_if(&id, |_, e| e.owner == owner).is_some();
        if removed {
            tracing::debug!(id = %id, "Discarded staged image");
        }
        removed
    }

    /// Drop staged images older than the staging TTL.
    pub fn purge_expired(&self) -> usize {
        let before = self.staged.len();
        self.staged.retain(|_, e| e.staged_at.elapsed() < self.staging_ttl);
        let purged = before.saturating_sub(self.staged.len());
        if purged > 0 {
            tracing::debug!(purged, "Purged expired staged images");
        }
        purged
    }

    /// Delete a committed object.
    pub async fn delete_committed(&self, committed: &Committed) -> Result<(), AssetError> {
        let path = self
            .store
            .path_from_url(committed.url())
            .ok_or_else(|| AssetError::ForeignUrl(committed.url().to_string()))?;
        self.store.delete(&path).await?;
        Ok(())
    }

    /// Delete an object nothing references any more. On failure the object
    /// is kept as an orphan for [`AssetPipeline::sweep_orphans`].
    pub async fn retire(&self, committed: &Committed) -> Result<(), AssetError> {
        match self.delete_committed(committed).await {
            Ok(()) => Ok(()),
            Err(AssetError::ForeignUrl(url)) => {
                // Not ours to delete, e.g. an image imported by reference.
                tracing::debug!(url = %url, "Skipping deletion of foreign image");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    url = %committed.url(),
                    error = %e,
                    "Failed to delete stale image, keeping it for the orphan sweep"
                );
                self.orphans.insert(committed.url().to_string());
                Err(e)
            }
        }
    }

    /// Read a committed image back as a data URI.
    pub async fn load(&self, committed: &Committed) -> Result<DataUri, AssetError> {
        let path = self
            .store
            .path_from_url(committed.url())
            .ok_or_else(|| AssetError::ForeignUrl(committed.url().to_string()))?;
        let bytes = self.store.get(&path).await?;
        let mime = validate_image(&bytes, usize::MAX)
            .unwrap_or_else(|_| DEFAULT_IMAGE_MIME.to_string());
        Ok(DataUri::new(mime, bytes))
    }

    /// Objects whose deletion failed and is still outstanding.
    pub fn orphans(&self) -> Vec<Orphaned> {
        let mut orphans: Vec<Orphaned> = self
            .orphans
            .iter()
            .map(|url| Orphaned { url: url.clone() })
            .collect();
        orphans.sort_by(|a, b| a.url.cmp(&b.url));
        orphans
    }

    /// Retry deletion of every orphan. Returns those that still could not be
    /// deleted.
    pub async fn sweep_orphans(&self) -> Vec<Orphaned> {
        let pending = self.orphans();
        if pending.is_empty() {
            return pending;
        }

        let mut remaining = Vec::new();
        for orphan in pending {
            match self.delete_committed(&Committed::from_url(&orphan.url)).await {
                Ok(()) | Err(AssetError::ForeignUrl(_)) => {
                    self.orphans.remove(&orphan.url);
                }
                Err(e) => {
                    tracing::debug!(url = %orphan.url, error = %e, "Orphan still not deletable");
                    remaining.push(orphan);
                }
            }
        }

        tracing::info!(remaining = remaining.len(), "Orphan sweep finished");
        remaining
    }
}

/// `users/{owner}/{millis}-{random}.{ext}`. The origin filename never
/// contributes to the path.
fn object_path(owner: Uuid, mime: &str) -> String {
    format!(
        "users/{}/{}-{}.{}",
        owner,
        chrono::Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        extension_for(mime)
    )
}
