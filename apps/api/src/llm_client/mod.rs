//! LLM Client: the single point of entry for all Gemini calls in ResuMatch.
//!
//! ARCHITECTURAL RULE: No other module may talk to a model endpoint directly.
//! Task code builds a `TaskRequest` and hands it to `GenerationClient`.
//!
//! Every successful call returns its payload together with `UsageMetrics`
//! (tokens, estimated cost, latency, model id).
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub mod gemini;
pub mod pricing;
pub mod retry;
pub mod schema;
#[cfg(test)]
pub mod testing;

use pricing::Pricing;
use retry::{with_retry, RetryError, RetryPolicy};
use schema::Schema;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Text returned by the grounded path when the model produced nothing.
const NO_RESULTS_TEXT: &str = "No results found.";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM response violated the output schema: {0}")]
    SchemaViolation(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("LLM call failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<LlmError>,
    },
}

impl LlmError {
    /// HTTP status reported by the provider, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::Api { status, .. } => Some(*status),
            LlmError::Http(e) => e.status().map(|s| s.as_u16()),
            LlmError::RetriesExhausted { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Any 4xx, rate limiting included: the provider rejected the request itself.
    pub fn is_client_error(&self) -> bool {
        matches!(self.status(), Some(s) if (400..500).contains(&s))
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Http(_) | LlmError::Api { .. } => !self.is_client_error(),
            LlmError::EmptyContent => true,
            LlmError::SchemaViolation(_)
            | LlmError::InvalidRequest(_)
            | LlmError::RetriesExhausted { .. } => false,
        }
    }
}

impl From<RetryError<LlmError>> for LlmError {
    fn from(err: RetryError<LlmError>) -> Self {
        match err {
            RetryError::Fatal(e) => e,
            RetryError::Exhausted { attempts, last } => LlmError::RetriesExhausted {
                attempts,
                source: Box::new(last),
            },
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Request side
// ────────────────────────────────────────────────────────────────────────────

/// How the model is asked to answer. Schema output and search grounding cannot be combined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResponseMode {
    PlainText,
    StructuredJson(&'static Schema),
    SearchGrounded,
}

/// One logical task call: prompt, answer mode and sampling temperature.
#[derive(Debug, Clone)]
pub struct TaskRequest {
    pub prompt: String,
    pub mode: ResponseMode,
    pub temperature: f32,
}

impl TaskRequest {
    pub const DEFAULT_TEMPERATURE: f32 = 0.1;

    #[allow(dead_code)]
    pub fn plain(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            mode: ResponseMode::PlainText,
            temperature: Self::DEFAULT_TEMPERATURE,
        }
    }

    pub fn structured(prompt: impl Into<String>, schema: &'static Schema) -> Self {
        Self {
            prompt: prompt.into(),
            mode: ResponseMode::StructuredJson(schema),
            temperature: Self::DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// What an endpoint receives for a single attempt.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    /// `None` leaves sampling at the provider default.
    pub temperature: Option<f32>,
    pub mode: ResponseMode,
}

// ────────────────────────────────────────────────────────────────────────────
// Response side
// ────────────────────────────────────────────────────────────────────────────

/// Provider-neutral view of one model response.
#[derive(Debug, Clone, Default)]
pub struct ModelResponse {
    pub text: Option<String>,
    pub usage: Option<TokenUsage>,
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_token_count: Option<u32>,
    #[serde(default)]
    pub candidates_token_count: Option<u32>,
    #[serde(default)]
    pub total_token_count: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebSource {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Token, cost and latency telemetry attached to every task result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetrics {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
    /// Estimated USD.
    pub total_cost: f64,
    pub latency_ms: u64,
    pub model: String,
}

/// A task payload plus the usage metrics of the call that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generated<T> {
    #[serde(flatten)]
    pub data: T,
    pub usage: UsageMetrics,
}

/// Payload of a free-text call.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOutput {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub title: String,
    pub url: String,
}

/// Payload of a search-grounded call: the answer and the sources the provider cited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundedOutput {
    pub text: String,
    pub links: Vec<Link>,
}

// ────────────────────────────────────────────────────────────────────────────
// Endpoint seam
// ────────────────────────────────────────────────────────────────────────────

/// A hosted model that accepts a prompt and answers with text plus usage and
/// grounding metadata. `gemini::GeminiEndpoint` is the production implementation.
#[async_trait]
pub trait ModelEndpoint: Send + Sync {
    async fn generate_content(&self, request: ModelRequest<'_>)
        -> Result<ModelResponse, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// Immutable client settings, injected once at startup.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub model: String,
    pub pricing: Pricing,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            pricing: Pricing::GEMINI_FLASH,
            retry: RetryPolicy::default(),
        }
    }
}

/// The single generation client used by all task methods.
/// Stateless apart from its configuration; cheap to clone and safe to share.
#[derive(Clone)]
pub struct GenerationClient {
    endpoint: Arc<dyn ModelEndpoint>,
    config: Arc<ClientConfig>,
}

impl GenerationClient {
    pub fn new(endpoint: Arc<dyn ModelEndpoint>, config: ClientConfig) -> Self {
        Self {
            endpoint,
            config: Arc::new(config),
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Runs one task request with retry and backoff on transient failures.
    ///
    /// Structured requests are parsed and checked against their schema; a payload that
    /// does not conform fails with `SchemaViolation` and is not retried. Plain and search
    /// requests yield `{ "text": ... }`.
    pub async fn generate<T: DeserializeOwned>(
        &self,
        request: &TaskRequest,
    ) -> Result<Generated<T>, LlmError> {
        if !(0.0..=2.0).contains(&request.temperature) {
            return Err(LlmError::InvalidRequest(format!(
                "temperature {} is outside [0, 2]",
                request.temperature
            )));
        }

        let start = Instant::now();
        let model_request = ModelRequest {
            model: &self.config.model,
            prompt: &request.prompt,
            temperature: Some(request.temperature),
            mode: request.mode,
        };

        let (text, usage) = with_retry(&self.config.retry, LlmError::is_retryable, |attempt| {
            let endpoint = &self.endpoint;
            async move {
                debug!(attempt, model = model_request.model, "calling model endpoint");
                let response = endpoint.generate_content(model_request).await?;
                let text = response
                    .text
                    .filter(|t| !t.trim().is_empty())
                    .ok_or(LlmError::EmptyContent)?;
                Ok((text, response.usage))
            }
        })
        .await?;

        let usage = self.usage_metrics(usage, start.elapsed());
        let data = match request.mode {
            ResponseMode::StructuredJson(schema) => parse_structured(&text, schema)?,
            ResponseMode::PlainText | ResponseMode::SearchGrounded => {
                serde_json::from_value(json!({ "text": text })).map_err(|e| {
                    LlmError::SchemaViolation(format!("text payload rejected by caller type: {e}"))
                })?
            }
        };

        info!(
            model = %usage.model,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            cost_usd = usage.total_cost,
            latency_ms = usage.latency_ms,
            "LLM call succeeded"
        );

        Ok(Generated { data, usage })
    }

    /// Search-grounded free-text call that also returns the provider's cited links.
    ///
    /// Single attempt: any failure is returned as-is.
    pub async fn generate_with_grounding(
        &self,
        prompt: &str,
    ) -> Result<Generated<GroundedOutput>, LlmError> {
        let start = Instant::now();
        let response = self
            .endpoint
            .generate_content(ModelRequest {
                model: &self.config.model,
                prompt,
                temperature: None,
                mode: ResponseMode::SearchGrounded,
            })
            .await
            .map_err(|e| {
                warn!("Grounded LLM call failed: {e}");
                e
            })?;

        let usage = self.usage_metrics(response.usage, start.elapsed());
        let links = extract_links(&response.grounding_chunks);
        let text = response
            .text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| NO_RESULTS_TEXT.to_string());

        info!(
            links = links.len(),
            cost_usd = usage.total_cost,
            latency_ms = usage.latency_ms,
            "Grounded LLM call succeeded"
        );

        Ok(Generated {
            data: GroundedOutput { text, links },
            usage,
        })
    }

    fn usage_metrics(&self, usage: Option<TokenUsage>, latency: Duration) -> UsageMetrics {
        let usage = usage.unwrap_or_default();
        let input_tokens = usage.prompt_token_count.unwrap_or(0);
        let output_tokens = usage.candidates_token_count.unwrap_or(0);
        let total_tokens = input_tokens.saturating_add(output_tokens);

        if let Some(reported) = usage.total_token_count {
            if reported != total_tokens {
                debug!(
                    reported,
                    counted = total_tokens,
                    "provider total includes tokens outside prompt/candidates"
                );
            }
        }

        UsageMetrics {
            input_tokens,
            output_tokens,
            total_tokens,
            total_cost: self.config.pricing.cost(input_tokens, output_tokens),
            latency_ms: u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
            model: self.config.model.clone(),
        }
    }
}

/// Keeps only chunks that carry both a URL and a title.
pub fn extract_links(chunks: &[GroundingChunk]) -> Vec<Link> {
    chunks
        .iter()
        .filter_map(|chunk| {
            let web = chunk.web.as_ref()?;
            let url = web.uri.as_deref().filter(|s| !s.is_empty())?;
            let title = web.title.as_deref().filter(|s| !s.is_empty())?;
            Some(Link {
                title: title.to_string(),
                url: url.to_string(),
            })
        })
        .collect()
}

fn parse_structured<T: DeserializeOwned>(text: &str, schema: &Schema) -> Result<T, LlmError> {
    let value: serde_json::Value = serde_json::from_str(strip_json_fences(text))
        .map_err(|e| LlmError::SchemaViolation(format!("response is not valid JSON: {e}")))?;

    schema.validate(&value).map_err(LlmError::SchemaViolation)?;

    serde_json::from_value(value).map_err(|e| LlmError::SchemaViolation(e.to_string()))
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(stripped) => {
            let stripped = stripped.trim_start();
            stripped
                .strip_suffix("```")
                .map(str::trim)
                .unwrap_or(stripped)
        }
        None => text,
    }
}
