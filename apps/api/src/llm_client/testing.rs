//! Scripted model endpoint for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{LlmError, ModelEndpoint, ModelRequest, ModelResponse, ResponseMode, TokenUsage};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub prompt: String,
    pub temperature: Option<f32>,
    pub mode: ResponseMode,
}

/// Replays a fixed list of replies, one per call, and records every request.
/// Once the script runs out it answers with a 500.
pub struct ScriptedEndpoint {
    replies: Mutex<VecDeque<Result<ModelResponse, LlmError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedEndpoint {
    pub fn new(replies: Vec<Result<ModelResponse, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelEndpoint for ScriptedEndpoint {
    async fn generate_content(
        &self,
        request: ModelRequest<'_>,
    ) -> Result<ModelResponse, LlmError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            prompt: request.prompt.to_string(),
            temperature: request.temperature,
            mode: request.mode,
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(api_error(500)))
    }
}

pub fn api_error(status: u16) -> LlmError {
    LlmError::Api {
        status,
        message: format!("scripted {status}"),
    }
}

/// A real connection-refused error from a port that was just released.
pub async fn transport_error() -> LlmError {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = reqwest::get(format!("http://{addr}/")).await.unwrap_err();
    LlmError::Http(err)
}

pub fn text_reply(text: &str) -> ModelResponse {
    ModelResponse {
        text: Some(text.to_string()),
        usage: Some(TokenUsage {
            prompt_token_count: Some(10),
            candidates_token_count: Some(5),
            total_token_count: Some(15),
        }),
        grounding_chunks: Vec::new(),
    }
}

pub fn json_reply(body: &str, input_tokens: u32, output_tokens: u32) -> ModelResponse {
    ModelResponse {
        text: Some(body.to_string()),
        usage: Some(TokenUsage {
            prompt_token_count: Some(input_tokens),
            candidates_token_count: Some(output_tokens),
            total_token_count: Some(input_tokens + output_tokens),
        }),
        grounding_chunks: Vec::new(),
    }
}
