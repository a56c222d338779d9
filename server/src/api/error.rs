use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use essensplan_core::{
    AiError, AssetError, EnhanceError, ExtractError, ImportError, RepositoryError,
    ValidationError,
};
use serde::Serialize;
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

/// Shared error response used by all endpoints
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Stable machine-readable code, e.g. `VALIDATION_FAILED`.
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<JsonValue>,
}

/// A problem that did not prevent the request from succeeding.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Warning {
    pub code: String,
    pub message: String,
}

impl From<&ImportError> for Warning {
    fn from(error: &ImportError) -> Self {
        let code = match error {
            ImportError::AssetFetch(_) => "IMAGE_FETCH_FAILED",
            ImportError::AssetCommit(_) => "IMAGE_COMMIT_FAILED",
            ImportError::AssetCleanup { .. } => "IMAGE_CLEANUP_FAILED",
            _ => "INTERNAL_SERVER_ERROR",
        };
        Warning {
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}

pub fn warnings(errors: &[ImportError]) -> Vec<Warning> {
    errors.iter().map(Warning::from).collect()
}

/// Error returned by handlers; renders as [`ErrorResponse`].
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<JsonValue>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: JsonValue) -> Self {
        self.details = Some(details);
        self
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "MISSING_REQUIRED_FIELD",
            format!("{} is required", field),
        )
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            message,
        )
    }

    fn validation(errors: &[ValidationError]) -> Self {
        let mut error = Self::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "Recipe failed validation",
        );
        if let Ok(details) = serde_json::to_value(errors) {
            error = error.with_details(details);
        }
        error
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, message = %self.message, "request failed");
        }

        (
            self.status,
            Json(ErrorResponse {
                error: ErrorBody {
                    code: self.code.to_string(),
                    message: self.message,
                    details: self.details,
                },
            }),
        )
            .into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::invalid_request(rejection.body_text())
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApiError::validation(std::slice::from_ref(&error))
    }
}

impl From<AiError> for ApiError {
    fn from(error: AiError) -> Self {
        match error {
            AiError::Config(_) => ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "AI_NOT_CONFIGURED",
                "AI capability is not configured",
            ),
            other => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "AI_REQUEST_FAILED",
                other.to_string(),
            ),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound(_) => ApiError::not_found("Recipe not found"),
            RepositoryError::Unavailable(_) => ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                error.to_string(),
            ),
        }
    }
}

impl From<AssetError> for ApiError {
    fn from(error: AssetError) -> Self {
        match error {
            AssetError::NotStaged(_) => ApiError::not_found(error.to_string()),
            AssetError::Fetch(_) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "IMAGE_FETCH_FAILED",
                error.to_string(),
            ),
            AssetError::Invalid(_) => ApiError::invalid_request(error.to_string()),
            AssetError::ForeignUrl(_) | AssetError::Store(_) => ApiError::internal(error.to_string()),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(error: ImportError) -> Self {
        match error {
            ImportError::Authentication(message) => {
                ApiError::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
            }
            ImportError::Validation(errors) => ApiError::validation(&errors),
            ImportError::Extraction(ExtractError::Capability(e)) => e.into(),
            ImportError::Extraction(e @ ExtractError::Nothing(_)) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "AI_REQUEST_FAILED",
                e.to_string(),
            ),
            ImportError::AssetFetch(e) => e.into(),
            e @ (ImportError::AssetCommit(_) | ImportError::AssetCleanup { .. }) => {
                ApiError::internal(e.to_string())
            }
            ImportError::Repository(e) => e.into(),
        }
    }
}

impl From<EnhanceError> for ApiError {
    fn from(error: EnhanceError) -> Self {
        match error {
            EnhanceError::InFlight(_) => {
                ApiError::new(StatusCode::CONFLICT, "CONFLICT", error.to_string())
            }
            EnhanceError::NoImageOnRecord(_) => ApiError::invalid_request(error.to_string()),
            EnhanceError::NoImage => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "AI_REQUEST_FAILED",
                error.to_string(),
            ),
            EnhanceError::CandidateNotFound(_) => ApiError::not_found(error.to_string()),
            EnhanceError::Capability(e) => e.into(),
            EnhanceError::Asset(e) => e.into(),
            EnhanceError::Repository(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use essensplan_core::ai::ConfigError;
    use uuid::Uuid;

    #[test]
    fn test_validation_details_carry_fields() {
        let error = ApiError::from(ImportError::Validation(vec![
            ValidationError::new("title", "is required"),
            ValidationError::new("tags[1]", "unknown tag"),
        ]));
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.code, "VALIDATION_FAILED");
        let details = error.details.unwrap();
        assert_eq!(details[1]["field"], "tags[1]");
    }

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(ApiError, StatusCode, &str)> = vec![
            (
                AiError::Config(ConfigError::MissingEnvVar("OPENAI_API_KEY".into())).into(),
                StatusCode::SERVICE_UNAVAILABLE,
                "AI_NOT_CONFIGURED",
            ),
            (
                ImportError::Extraction(ExtractError::Nothing("blank".into())).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
                "AI_REQUEST_FAILED",
            ),
            (
                EnhanceError::InFlight(Uuid::new_v4()).into(),
                StatusCode::CONFLICT,
                "CONFLICT",
            ),
            (
                RepositoryError::NotFound(Uuid::new_v4()).into(),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                AssetError::Fetch("404".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
                "IMAGE_FETCH_FAILED",
            ),
            (
                ImportError::Authentication("expired".into()).into(),
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
            ),
        ];

        for (error, status, code) in cases {
            assert_eq!(error.status, status, "{}", code);
            assert_eq!(error.code, code);
        }
    }

    #[test]
    fn test_warning_codes() {
        let warning = Warning::from(&ImportError::AssetCommit(AssetError::Invalid("x".into())));
        assert_eq!(warning.code, "IMAGE_COMMIT_FAILED");
    }
}
