//! AI request and response types.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One piece of user input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputPart {
    InputText { text: String },
    /// Image as a data URI or remote URL.
    InputImage { image_url: String, detail: String },
}

impl InputPart {
    pub fn text(text: impl Into<String>) -> Self {
        InputPart::InputText { text: text.into() }
    }

    /// Image input at high detail, which recipe reading needs.
    pub fn image(image_url: impl Into<String>) -> Self {
        InputPart::InputImage {
            image_url: image_url.into(),
            detail: "high".to_string(),
        }
    }
}

/// Hosted tools the capability may use while answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tool {
    #[serde(rename = "web_search_preview")]
    WebSearch,
    ImageGeneration,
}

/// Requested shape of the text output.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Text,
    /// Strict JSON conforming to the given schema.
    JsonSchema { name: String, schema: JsonValue },
}

/// Request to the capability.
#[derive(Debug, Clone, Default)]
pub struct AiRequest {
    /// System-level instructions.
    pub instructions: String,
    pub input: Vec<InputPart>,
    pub tools: Vec<Tool>,
    pub output: OutputFormat,
}

impl AiRequest {
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.input.push(InputPart::text(text));
        self
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.input.push(InputPart::image(image_url));
        self
    }

    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_json_schema(mut self, name: impl Into<String>, schema: JsonValue) -> Self {
        self.output = OutputFormat::JsonSchema {
            name: name.into(),
            schema,
        };
        self
    }

    /// Concatenated text inputs, handy for logging and fakes.
    pub fn input_text(&self) -> String {
        self.input
            .iter()
            .filter_map(|p| match p {
                InputPart::InputText { text } => Some(text.as_str()),
                InputPart::InputImage { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn image_count(&self) -> usize {
        self.input
            .iter()
            .filter(|p| matches!(p, InputPart::InputImage { .. }))
            .count()
    }
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}

/// Response from the capability.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AiResponse {
    /// Concatenated output text, if any was produced.
    pub text: Option<String>,
    /// Base64 payloads of generated images, in output order.
    pub images: Vec<String>,
    pub usage: Usage,
}
