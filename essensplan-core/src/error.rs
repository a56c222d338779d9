use serde::Serialize;
use thiserror::Error;

use crate::ai::AiError;
use crate::assets::AssetError;
use crate::repository::RepositoryError;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Host not allowed: {0}")]
    HostNotAllowed(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Response too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Unavailable: {0}")]
    Unavailable(String),
}

/// A single field-level complaint about a recipe draft or import request.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Path of the offending field, e.g. `tags[2]` or `ingredients[0].amount`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Extraction capability failed: {0}")]
    Capability(#[from] AiError),

    #[error("Extraction produced nothing: {0}")]
    Nothing(String),
}

/// Error taxonomy of a whole import attempt.
///
/// Extraction and validation errors abort the import. Asset errors degrade:
/// the recipe text survives and the image is dropped.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Authentication required: {0}")]
    Authentication(String),

    #[error("Recipe failed validation: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Extraction(#[from] ExtractError),

    #[error("Image could not be fetched: {0}")]
    AssetFetch(#[source] AssetError),

    #[error("Image could not be saved: {0}")]
    AssetCommit(#[source] AssetError),

    #[error("Stale image {url} could not be deleted: {source}")]
    AssetCleanup {
        url: String,
        #[source]
        source: AssetError,
    },

    #[error("Recipe storage failed: {0}")]
    Repository(#[from] RepositoryError),
}

impl ImportError {
    /// Whether this error aborts the whole import attempt.
    pub fn is_fatal(&self) -> bool {
        match self {
            ImportError::Authentication(_)
            | ImportError::Validation(_)
            | ImportError::Extraction(_)
            | ImportError::Repository(_) => true,
            ImportError::AssetFetch(_)
            | ImportError::AssetCommit(_)
            | ImportError::AssetCleanup { .. } => false,
        }
    }

    /// Whether reissuing the same user action could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ImportError::Extraction(_)
                | ImportError::AssetFetch(_)
                | ImportError::AssetCommit(_)
                | ImportError::Repository(RepositoryError::Unavailable(_))
        )
    }

    /// Field-level details for validation failures, empty otherwise.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            ImportError::Validation(errors) => errors,
            _ => &[],
        }
    }
}

impl From<ValidationError> for ImportError {
    fn from(error: ValidationError) -> Self {
        ImportError::Validation(vec![error])
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
