//! Durable object storage for committed images.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Storage addressed by relative paths such as `users/{account}/{name}.jpg`.
///
/// Public URLs are derived from the path deterministically, and the path can
/// be recovered from a URL this store issued.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<(), StoreError>;

    async fn get(&self, path: &str) -> Result<Vec<u8>, StoreError>;

    /// Deleting a missing object succeeds.
    async fn delete(&self, path: &str) -> Result<(), StoreError>;

    /// Base URL under which objects are publicly served, without trailing slash.
    fn public_base_url(&self) -> &str;

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base_url(), path)
    }

    /// Reverse of [`ObjectStore::public_url`]. `None` for URLs this store
    /// did not issue.
    fn path_from_url(&self, url: &str) -> Option<String> {
        let rest = url.strip_prefix(self.public_base_url())?.strip_prefix('/')?;
        let path = rest.split(['?', '#']).next().unwrap_or(rest);
        check_path(path).ok()?;
        Some(path.to_string())
    }
}

/// Reject anything that could escape the storage root.
pub(crate) fn check_path(path: &str) -> Result<(), StoreError> {
    let valid = !path.is_empty()
        && path.split('/').all(|segment| {
            !segment.is_empty()
                && segment != "."
                && segment != ".."
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        });

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidPath(path.to_string()))
    }
}

/// Objects as files under a root directory.
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_path(&self, path: &str) -> Result<PathBuf, StoreError> {
        check_path(path)?;
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, path: &str, bytes: &[u8], _content_type: &str) -> Result<(), StoreError> {
        let target = self.file_path(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write to a temporary sibling first so a reader never sees half a file
        let tmp = target.with_extension(format!("tmp-{}", Uuid::new_v4().simple()));
        if let Err(e) = tokio::fs::write(&tmp, bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        tokio::fs::rename(&tmp, &target).await?;

        tracing::debug!(path, size = bytes.len(), "store: wrote object");
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        let target = self.file_path(path)?;
        match tokio::fs::read(&target).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let target = self.file_path(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => {
                tracing::debug!(path, "store: deleted object");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn public_base_url(&self) -> &str {
        &self.public_base_url
    }
}

/// In-memory store for tests, with switchable failures.
pub struct MemoryObjectStore {
    objects: DashMap<String, (Vec<u8>, String)>,
    public_base_url: String,
    puts: AtomicUsize,
    delete_attempts: Mutex<Vec<String>>,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new("http://storage.test/recipe-images")
    }
}

impl MemoryObjectStore {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            objects: DashMap::new(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            puts: AtomicUsize::new(0),
            delete_attempts: Mutex::new(Vec::new()),
            fail_puts: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.objects.contains_key(path)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Paths of all stored objects, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.objects.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }

    pub fn content_type(&self, path: &str) -> Option<String> {
        self.objects.get(path).map(|e| e.value().1.clone())
    }

    /// Successful puts so far.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Every path a delete was attempted for, failed or not.
    pub fn delete_attempts(&self) -> Vec<String> {
        self.delete_attempts
            .lock()
            .map(|attempts| attempts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<(), StoreError> {
        check_path(path)?;
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("put disabled".to_string()));
        }
        self.objects
            .insert(path.to_string(), (bytes.to_vec(), content_type.to_string()));
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        self.objects
            .get(path)
            .map(|e| e.value().0.clone())
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        if let Ok(mut attempts) = self.delete_attempts.lock() {
            attempts.push(path.to_string());
        }
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("delete disabled".to_string()));
        }
        self.objects.remove(path);
        Ok(())
    }

    fn public_base_url(&self) -> &str {
        &self.public_base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_path() {
        assert!(check_path("users/abc/123-def.png").is_ok());
        for bad in ["", "/etc/passwd", "users/../x", "users//x", "users/a b.png", "a/./b"] {
            assert!(check_path(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_url_roundtrip() {
        let store = MemoryObjectStore::new("http://localhost:3000/storage/v1/object/public/recipe-images/");
        let url = store.public_url("users/u/1-a.jpg");
        assert_eq!(
            url,
            "http://localhost:3000/storage/v1/object/public/recipe-images/users/u/1-a.jpg"
        );
        assert_eq!(store.path_from_url(&url).as_deref(), Some("users/u/1-a.jpg"));
        assert_eq!(
            store.path_from_url(&format!("{}?v=2", url)).as_deref(),
            Some("users/u/1-a.jpg")
        );
        assert_eq!(store.path_from_url("https://elsewhere.example/users/u/1-a.jpg"), None);
        assert_eq!(
            store.path_from_url(
                "http://localhost:3000/storage/v1/object/public/recipe-images/../secret"
            ),
            None
        );
    }

    #[tokio::test]
    async fn test_local_store_put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path(), "http://localhost/img");

        store.put("users/u/1-a.png", b"png", "image/png").await.unwrap();
        assert_eq!(store.get("users/u/1-a.png").await.unwrap(), b"png");
        assert!(dir.path().join("users/u/1-a.png").exists());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("users/u"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains("tmp-"))
            .collect();
        assert!(leftovers.is_empty());

        store.delete("users/u/1-a.png").await.unwrap();
        assert!(matches!(
            store.get("users/u/1-a.png").await,
            Err(StoreError::NotFound(_))
        ));
        // Deleting again is fine
        store.delete("users/u/1-a.png").await.unwrap();
    }

    #[tokio::test]
    async fn test_local_store_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path(), "http://localhost/img");
        let result = store.put("../outside.png", b"x", "image/png").await;
        assert!(matches!(result, Err(StoreError::InvalidPath(_))));
    }

    #[tokio::test]
    async fn test_memory_store_failure_switches() {
        let store = MemoryObjectStore::default();
        store.put("users/u/a.png", b"1", "image/png").await.unwrap();

        store.set_fail_deletes(true);
        assert!(store.delete("users/u/a.png").await.is_err());
        assert!(store.contains("users/u/a.png"));
        assert_eq!(store.delete_attempts(), vec!["users/u/a.png".to_string()]);

        store.set_fail_puts(true);
        assert!(store.put("users/u/b.png", b"2", "image/png").await.is_err());
        assert_eq!(store.put_count(), 1);
        assert_eq!(store.content_type("users/u/a.png").as_deref(), Some("image/png"));
    }
}
