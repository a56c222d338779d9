//! Fake AI client for testing.
//!
//! Replies are scripted per prompt name and consumed in order, so tests can
//! run without network access or API costs. Every request is recorded.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use super::client::{AiClient, AiError};
use super::types::{AiRequest, AiResponse, Usage};

/// A scripted reply.
#[derive(Debug, Clone)]
pub enum FakeReply {
    Text(String),
    /// Base64 payload of a generated image.
    Image(String),
    /// A response with neither text nor images.
    Empty,
    /// Fail with an API error of the given status.
    Fail { status: u16, message: String },
}

/// A recorded call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt_name: String,
    pub request: AiRequest,
}

#[derive(Debug, Default)]
pub struct FakeAiClient {
    replies: Mutex<HashMap<String, VecDeque<FakeReply>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeAiClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next call with this prompt name.
    pub fn with_reply(self, prompt_name: &str, reply: FakeReply) -> Self {
        self.push_reply(prompt_name, reply);
        self
    }

    pub fn push_reply(&self, prompt_name: &str, reply: FakeReply) {
        self.replies
            .lock()
            .unwrap()
            .entry(prompt_name.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Calls made so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl AiClient for FakeAiClient {
    async fn complete(
        &self,
        prompt_name: &str,
        request: AiRequest,
    ) -> Result<AiResponse, AiError> {
        self.calls.lock().unwrap().push(RecordedCall {
            prompt_name: prompt_name.to_string(),
            request,
        });

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(prompt_name)
            .and_then(VecDeque::pop_front);

        let usage = Usage {
            input_tokens: 10,
            output_tokens: 5,
        };

        match reply {
            Some(FakeReply::Text(text)) => Ok(AiResponse {
                text: Some(text),
                images: vec![],
                usage,
            }),
            Some(FakeReply::Image(data)) => Ok(AiResponse {
                text: None,
                images: vec![data],
                usage,
            }),
            Some(FakeReply::Empty) => Ok(AiResponse {
                usage,
                ..Default::default()
            }),
            Some(FakeReply::Fail { status, message }) => Err(AiError::Api { status, message }),
            None => Err(AiError::RequestFailed(format!(
                "FakeAiClient: no reply scripted for prompt {}",
                prompt_name
            ))),
        }
    }
}
