//! Storage configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::ai::{parse_env, ConfigError};
use crate::image::DEFAULT_MAX_IMAGE_BYTES;

pub const DEFAULT_STORAGE_DIR: &str = "data/recipe-images";
pub const DEFAULT_PUBLIC_BASE_URL: &str =
    "http://localhost:3000/storage/v1/object/public/recipe-images";
pub const DEFAULT_STAGING_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub root_dir: PathBuf,
    pub public_base_url: String,
    pub max_image_bytes: usize,
    /// How long a staged image may wait for confirmation.
    pub staging_ttl: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            staging_ttl: Duration::from_secs(DEFAULT_STAGING_TTL_SECS),
        }
    }
}

impl StorageConfig {
    /// Load configuration from environment variables.
    ///
    /// All optional:
    /// - `ESSENSPLAN_STORAGE_DIR` (default: "data/recipe-images")
    /// - `ESSENSPLAN_PUBLIC_BASE_URL`
    /// - `ESSENSPLAN_MAX_IMAGE_BYTES` (default: 5 MiB)
    /// - `ESSENSPLAN_STAGING_TTL_SECS` (default: 3600)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(dir) = env::var("ESSENSPLAN_STORAGE_DIR") {
            config.root_dir = PathBuf::from(dir);
        }
        if let Ok(url) = env::var("ESSENSPLAN_PUBLIC_BASE_URL") {
            config.public_base_url = url.trim_end_matches('/').to_string();
        }
        config.max_image_bytes = parse_env("ESSENSPLAN_MAX_IMAGE_BYTES", config.max_image_bytes)?;
        config.staging_ttl = Duration::from_secs(parse_env(
            "ESSENSPLAN_STAGING_TTL_SECS",
            DEFAULT_STAGING_TTL_SECS,
        )?);

        Ok(config)
    }
}
