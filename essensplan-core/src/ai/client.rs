//! AI client implementation against an OpenAI-compatible Responses endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::config::AiConfig;
use super::types::{AiRequest, AiResponse, InputPart, OutputFormat, Tool, Usage};

#[derive(Error, Debug)]
pub enum AiError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

impl AiError {
    /// Transport failures, throttling and server-side errors.
    pub fn is_transient(&self) -> bool {
        match self {
            AiError::RequestFailed(_) | AiError::RateLimited { .. } => true,
            AiError::Api { status, .. } => *status >= 500,
            AiError::ParseError(_) | AiError::Config(_) => false,
        }
    }

    /// The capability rejected our credentials.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, AiError::Api { status: 401 | 403, .. })
    }
}

/// Trait for AI clients.
#[async_trait]
pub trait AiClient: Send + Sync {
    /// Run one request. `prompt_name` identifies the prompt in logs.
    async fn complete(&self, prompt_name: &str, request: AiRequest)
        -> Result<AiResponse, AiError>;
}

/// Responses API client with rate limiting and optional retries.
pub struct OpenAiClient {
    client: reqwest::Client,
    config: AiConfig,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl OpenAiClient {
    /// Create a new client from environment configuration.
    pub fn from_env() -> Result<Self, AiError> {
        let config = AiConfig::from_env()?;
        Self::new(config)
    }

    pub fn new(config: AiConfig) -> Result<Self, AiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AiError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            config,
            last_request: Arc::new(Mutex::new(None)),
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Apply rate limiting between requests.
    async fn rate_limit(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            let min_interval = Duration::from_millis(self.config.rate_limit_ms);

            if elapsed < min_interval {
                tokio::time::sleep(min_interval - elapsed).await;
            }
        }

        *last = Some(Instant::now());
    }

    async fn send_once(&self, body: &ResponsesRequest<'_>) -> Result<AiResponse, AiError> {
        self.rate_limit().await;

        let response = self
            .client
            .post(format!("{}/responses", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AiError::RequestFailed(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(AiError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| AiError::RequestFailed(e.to_string()))?;

        if !(200..300).contains(&status) {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(AiError::Api { status, message });
        }

        let parsed: ResponsesBody =
            serde_json::from_str(&text).map_err(|e| AiError::ParseError(e.to_string()))?;

        Ok(parsed.into_response())
    }
}

#[async_trait]
impl AiClient for OpenAiClient {
    async fn complete(
        &self,
        prompt_name: &str,
        request: AiRequest,
    ) -> Result<AiResponse, AiError> {
        let body = ResponsesRequest::from_request(&self.config.model, &request);

        let mut attempt = 0;
        loop {
            tracing::debug!(
                prompt_name,
                model = %self.config.model,
                attempt,
                images = request.image_count(),
                "Calling AI API"
            );

            match self.send_once(&body).await {
                Ok(response) => {
                    tracing::info!(
                        prompt_name,
                        input_tokens = response.usage.input_tokens,
                        output_tokens = response.usage.output_tokens,
                        "AI call completed"
                    );
                    return Ok(response);
                }
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = match &e {
                        AiError::RateLimited {
                            retry_after_secs: Some(secs),
                        } => Duration::from_secs(*secs),
                        _ => self.config.retry_backoff,
                    };
                    tracing::warn!(prompt_name, error = %e, attempt, "AI call failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    instructions: &'a str,
    input: Vec<InputMessage<'a>>,
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [Tool],
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<JsonValue>,
}

fn no_tools(tools: &&[Tool]) -> bool {
    tools.is_empty()
}

#[derive(Debug, Serialize)]
struct InputMessage<'a> {
    role: &'static str,
    content: &'a [InputPart],
}

impl<'a> ResponsesRequest<'a> {
    fn from_request(model: &'a str, request: &'a AiRequest) -> Self {
        let text = match &request.output {
            OutputFormat::Text => None,
            OutputFormat::JsonSchema { name, schema } => Some(json!({
                "format": {
                    "type": "json_schema",
                    "name": name,
                    "schema": schema,
                    "strict": true,
                }
            })),
        };

        Self {
            model,
            instructions: &request.instructions,
            input: vec![InputMessage {
                role: "user",
                content: &request.input,
            }],
            tools: &request.tools,
            text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResponsesBody {
    #[serde(default)]
    output: Vec<OutputItem>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutputItem {
    Message {
        #[serde(default)]
        content: Vec<OutputContent>,
    },
    ImageGenerationCall {
        #[serde(default)]
        result: Option<String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutputContent {
    OutputText {
        text: String,
    },
    #[serde(other)]
    Other,
}

impl ResponsesBody {
    fn into_response(self) -> AiResponse {
        let mut texts = Vec::new();
        let mut images = Vec::new();

        for item in self.output {
            match item {
                OutputItem::Message { content } => {
                    texts.extend(content.into_iter().filter_map(|c| match c {
                        OutputContent::OutputText { text } => Some(text),
                        OutputContent::Other => None,
                    }));
                }
                OutputItem::ImageGenerationCall { result: Some(data) } => images.push(data),
                OutputItem::ImageGenerationCall { result: None } | OutputItem::Other => {}
            }
        }

        AiResponse {
            text: if texts.is_empty() {
                None
            } else {
                Some(texts.concat())
            },
            images,
            usage: self.usage,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let request = AiRequest::new("extract")
            .with_text("https://example.com/recipe")
            .with_tool(Tool::WebSearch)
            .with_json_schema("recipe", json!({"type": "object"}));

        let body = ResponsesRequest::from_request("gpt-5-mini", &request);
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["model"], "gpt-5-mini");
        assert_eq!(value["instructions"], "extract");
        assert_eq!(value["input"][0]["role"], "user");
        assert_eq!(value["input"][0]["content"][0]["type"], "input_text");
        assert_eq!(value["tools"][0]["type"], "web_search_preview");
        assert_eq!(value["text"]["format"]["type"], "json_schema");
        assert_eq!(value["text"]["format"]["strict"], true);
    }

    #[test]
    fn test_plain_request_omits_tools_and_format() {
        let request = AiRequest::new("hi").with_text("there");
        let body = ResponsesRequest::from_request("m", &request);
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("tools").is_none());
        assert!(value.get("text").is_none());
    }

    #[test]
    fn test_parse_response_body() {
        let body: ResponsesBody = serde_json::from_str(
            r#"{
                "output": [
                    {"type": "web_search_call", "id": "ws_1", "status": "completed"},
                    {"type": "message", "content": [
                        {"type": "output_text", "text": "{\"title\":", "annotations": []},
                        {"type": "output_text", "text": "\"Gulasch\"}"}
                    ]},
                    {"type": "image_generation_call", "result": "aGVsbG8="}
                ],
                "usage": {"input_tokens": 120, "output_tokens": 40, "total_tokens": 160}
            }"#,
        )
        .unwrap();

        let response = body.into_response();
        assert_eq!(response.text.as_deref(), Some("{\"title\":\"Gulasch\"}"));
        assert_eq!(response.images, vec!["aGVsbG8=".to_string()]);
        assert_eq!(response.usage.input_tokens, 120);
    }

    #[test]
    fn test_empty_output_has_no_text() {
        let body: ResponsesBody = serde_json::from_str(r#"{"output": []}"#).unwrap();
        let response = body.into_response();
        assert!(response.text.is_none());
        assert!(response.images.is_empty());
    }

    #[test]
    fn test_error_classification() {
        assert!(AiError::RateLimited {
            retry_after_secs: None
        }
        .is_transient());
        assert!(AiError::Api {
            status: 503,
            message: "overloaded".into()
        }
        .is_transient());
        let unauthorized = AiError::Api {
            status: 401,
            message: "bad key".into(),
        };
        assert!(!unauthorized.is_transient());
        assert!(unauthorized.is_unauthenticated());
    }
}
