//! Gemini `generateContent` over HTTPS.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{
    GroundingChunk, LlmError, ModelEndpoint, ModelRequest, ModelResponse, ResponseMode,
    TokenUsage,
};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate.
    fn into_model_response(self) -> ModelResponse {
        let mut candidates = self.candidates.into_iter();
        let first = candidates.next();

        let (text, grounding_chunks) = match first {
            Some(candidate) => {
                let text: String = candidate
                    .content
                    .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
                    .unwrap_or_default();
                let chunks = candidate
                    .grounding_metadata
                    .map(|g| g.grounding_chunks)
                    .unwrap_or_default();
                ((!text.is_empty()).then_some(text), chunks)
            }
            None => (None, Vec::new()),
        };

        ModelResponse {
            text,
            usage: self.usage_metadata,
            grounding_chunks,
        }
    }
}

fn build_request<'a>(request: &ModelRequest<'a>) -> GenerateContentRequest<'a> {
    let mut generation_config = GenerationConfig {
        temperature: request.temperature,
        ..Default::default()
    };
    let mut tools = None;

    match request.mode {
        ResponseMode::PlainText => {}
        ResponseMode::StructuredJson(schema) => {
            generation_config.response_mime_type = Some("application/json");
            generation_config.response_schema = Some(schema.to_json());
        }
        ResponseMode::SearchGrounded => {
            tools = Some(vec![Tool {
                google_search: GoogleSearch {},
            }]);
        }
    }

    let has_config = generation_config.temperature.is_some()
        || generation_config.response_mime_type.is_some();

    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![RequestPart {
                text: request.prompt,
            }],
        }],
        generation_config: has_config.then_some(generation_config),
        tools,
    }
}

/// HTTP client for the Gemini API. One request per `generate_content` call; retries
/// are the caller's concern.
#[derive(Clone)]
pub struct GeminiEndpoint {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiEndpoint {
    pub fn new(api_key: String, base_url: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()?,
            api_key,
            base_url,
        })
    }

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model.strip_prefix("models/").unwrap_or(model)
        )
    }
}

#[async_trait]
impl ModelEndpoint for GeminiEndpoint {
    async fn generate_content(
        &self,
        request: ModelRequest<'_>,
    ) -> Result<ModelResponse, LlmError> {
        let body = build_request(&request);

        let response = self
            .client
            .post(self.generate_url(request.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!("Gemini API returned {}: {}", status, message);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        debug!(
            candidates = parsed.candidates.len(),
            "Gemini response received"
        );

        Ok(parsed.into_model_response())
    }
}
