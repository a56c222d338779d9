//! AI configuration from environment variables.

use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default OpenAI-compatible base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model to use.
pub const DEFAULT_MODEL: &str = "gpt-5-mini";

/// Image generation and web search can be slow; allow generous time.
pub const DEFAULT_TIMEOUT_SECS: u64 = 180;

pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

/// AI client configuration.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// Milliseconds to wait between requests. 0 disables.
    pub rate_limit_ms: u64,
    /// Retries for transient failures (429, 5xx, transport). 0 disables.
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub timeout: Duration,
}

impl AiConfig {
    /// Configuration with defaults for everything except the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_limit_ms: 0,
            max_retries: 0,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `OPENAI_API_KEY`
    ///
    /// Optional:
    /// - `ESSENSPLAN_AI_MODEL` (default: "gpt-5-mini")
    /// - `ESSENSPLAN_AI_BASE_URL` (default: "https://api.openai.com/v1")
    /// - `ESSENSPLAN_AI_RATE_LIMIT_MS` (default: 0)
    /// - `ESSENSPLAN_AI_MAX_RETRIES` (default: 0)
    /// - `ESSENSPLAN_AI_RETRY_BACKOFF_MS` (default: 1000)
    /// - `ESSENSPLAN_AI_TIMEOUT_SECS` (default: 180)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

        let mut config = Self::new(api_key);

        if let Ok(model) = env::var("ESSENSPLAN_AI_MODEL") {
            config.model = model;
        }
        if let Ok(base_url) = env::var("ESSENSPLAN_AI_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }

        config.rate_limit_ms = parse_env("ESSENSPLAN_AI_RATE_LIMIT_MS", config.rate_limit_ms)?;
        config.max_retries = parse_env("ESSENSPLAN_AI_MAX_RETRIES", config.max_retries)?;
        config.retry_backoff = Duration::from_millis(parse_env(
            "ESSENSPLAN_AI_RETRY_BACKOFF_MS",
            DEFAULT_RETRY_BACKOFF_MS,
        )?);
        config.timeout =
            Duration::from_secs(parse_env("ESSENSPLAN_AI_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?);

        Ok(config)
    }
}

/// Parse an optional numeric environment variable.
pub(crate) fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}
