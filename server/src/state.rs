use async_trait::async_trait;
use axum::extract::FromRef;
use essensplan_core::ai::{AiRequest, AiResponse, ConfigError};
use essensplan_core::{AiClient, AiError, EnhancementWorkflow, ImportService};
use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::SessionVerifier;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub imports: Arc<ImportService>,
    pub enhancements: Arc<EnhancementWorkflow>,
    pub ai: Arc<dyn AiClient>,
    pub sessions: Arc<dyn SessionVerifier>,
    /// Directory served under the public storage route.
    pub storage_root: PathBuf,
}

impl FromRef<AppState> for Arc<ImportService> {
    fn from_ref(state: &AppState) -> Self {
        state.imports.clone()
    }
}

impl FromRef<AppState> for Arc<EnhancementWorkflow> {
    fn from_ref(state: &AppState) -> Self {
        state.enhancements.clone()
    }
}

impl FromRef<AppState> for Arc<dyn AiClient> {
    fn from_ref(state: &AppState) -> Self {
        state.ai.clone()
    }
}

impl FromRef<AppState> for Arc<dyn SessionVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

/// Stands in for the capability when no API key is configured, so the
/// server still starts and reports the problem per request.
pub struct UnconfiguredAi;

#[async_trait]
impl AiClient for UnconfiguredAi {
    async fn complete(&self, prompt_name: &str, _request: AiRequest) -> Result<AiResponse, AiError> {
        tracing::warn!(prompt_name, "AI capability requested but not configured");
        Err(AiError::Config(ConfigError::MissingEnvVar(
            "OPENAI_API_KEY".to_string(),
        )))
    }
}
