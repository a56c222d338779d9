//! Turns what the user picked (a link, an uploaded photo) into the single
//! canonical payload the extraction coordinator consumes.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::image::validate_image;

/// Content type assumed when a data URI omits one.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Self-describing binary blob: `data:<mime>;base64,<payload>`.
#[derive(Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub data: Vec<u8>,
}

impl DataUri {
    pub fn new(mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            data,
        }
    }

    /// Parse a base64 data URI. Only the base64 form is accepted.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let rest = input
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| ValidationError::new("content", "expected a data URI"))?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ValidationError::new("content", "data URI has no payload"))?;

        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| ValidationError::new("content", "data URI must be base64 encoded"))?;

        let mime = if mime.is_empty() {
            DEFAULT_IMAGE_MIME.to_string()
        } else {
            mime.to_ascii_lowercase()
        };

        let data = BASE64
            .decode(payload.trim())
            .map_err(|e| ValidationError::new("content", format!("invalid base64: {}", e)))?;

        Ok(Self { mime, data })
    }

    /// Render as a `data:` URI string.
    pub fn encode(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64.encode(&self.data))
    }
}

impl fmt::Debug for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataUri")
            .field("mime", &self.mime)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Wire tag selecting the extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    #[serde(alias = "url")]
    Locator,
    #[serde(alias = "screenshot")]
    Image,
}

/// What the user selected as the import source.
#[derive(Debug, Clone)]
pub enum SourceSelection {
    /// A web reference typed or pasted by the user.
    Locator(String),
    /// Raw bytes of an uploaded file.
    Upload {
        bytes: Vec<u8>,
        filename: Option<String>,
    },
    /// An image already encoded as a data URI (the HTTP wire form).
    DataUri(String),
}

impl SourceSelection {
    /// Build a selection from the `{kind, content}` request shape.
    pub fn from_wire(kind: ImportKind, content: String) -> Self {
        match kind {
            ImportKind::Locator => SourceSelection::Locator(content),
            ImportKind::Image => SourceSelection::DataUri(content),
        }
    }
}

/// Canonical extraction input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    /// Absolute http(s) URI, kept exactly as the user supplied it (trimmed).
    Locator(String),
    /// Validated image with a sniffed content type.
    Image {
        image: DataUri,
        origin_filename: Option<String>,
    },
}

impl ImportSource {
    pub fn kind(&self) -> ImportKind {
        match self {
            ImportSource::Locator(_) => ImportKind::Locator,
            ImportSource::Image { .. } => ImportKind::Image,
        }
    }
}

/// Normalize a selection into an [`ImportSource`].
pub fn normalize(
    selection: SourceSelection,
    max_image_bytes: usize,
) -> Result<ImportSource, ValidationError> {
    match selection {
        SourceSelection::Locator(raw) => normalize_locator(&raw).map(ImportSource::Locator),
        SourceSelection::Upload { bytes, filename } => {
            let mime = validate_image(&bytes, max_image_bytes)
                .map_err(|e| ValidationError::new("content", e.to_string()))?;
            Ok(ImportSource::Image {
                image: DataUri::new(mime, bytes),
                origin_filename: filename,
            })
        }
        SourceSelection::DataUri(raw) => {
            let parsed = DataUri::parse(&raw)?;
            // The declared mime is not trusted; the sniffed one replaces it.
            let mime = validate_image(&parsed.data, max_image_bytes)
                .map_err(|e| ValidationError::new("content", e.to_string()))?;
            Ok(ImportSource::Image {
                image: DataUri::new(mime, parsed.data),
                origin_filename: None,
            })
        }
    }
}

fn normalize_locator(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("content", "is required"));
    }

    let parsed = url::Url::parse(trimmed)
        .map_err(|e| ValidationError::new("content", format!("invalid URL: {}", e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ValidationError::new(
            "content",
            format!("unsupported URL scheme: {}", parsed.scheme()),
        ));
    }
    if parsed.host_str().is_none() {
        return Err(ValidationError::new("content", "URL has no host"));
    }

    Ok(trimmed.to_string())
}
