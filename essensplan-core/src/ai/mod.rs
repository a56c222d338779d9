//! AI capability integration.
//!
//! This module provides:
//! - `AiClient` trait for abstracting the capability
//! - `OpenAiClient` talking to an OpenAI-compatible Responses endpoint
//! - `FakeAiClient` with scripted replies for tests
//! - Prompt templates for extraction and image enhancement
//!
//! # Configuration
//!
//! - `OPENAI_API_KEY` (required): API key for the capability
//! - `ESSENSPLAN_AI_MODEL` (optional): Model name, e.g. "gpt-5-mini"
//! - `ESSENSPLAN_AI_BASE_URL` (optional): API base URL
//! - `ESSENSPLAN_AI_RATE_LIMIT_MS` (optional): Delay between requests in ms
//! - `ESSENSPLAN_AI_MAX_RETRIES` (optional): Retries for transient failures
//!
//! # Example
//!
//! ```ignore
//! use essensplan_core::ai::{AiClient, AiRequest, OpenAiClient};
//!
//! let client = OpenAiClient::from_env()?;
//! let response = client
//!     .complete("test", AiRequest::new("Be brief.").with_text("Hello!"))
//!     .await?;
//! println!("Response: {:?}", response.text);
//! ```

mod client;
mod config;
mod fake;
pub mod prompts;
mod types;

pub use client::{AiClient, AiError, OpenAiClient};
pub use config::{AiConfig, ConfigError};
pub(crate) use config::parse_env;
pub use fake::{FakeAiClient, FakeReply, RecordedCall};
pub use types::{AiRequest, AiResponse, InputPart, OutputFormat, Tool, Usage};
