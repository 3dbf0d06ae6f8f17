use anyhow::{Context, Result};

use crate::llm_client::gemini::GEMINI_BASE_URL;
use crate::llm_client::pricing::Pricing;
use crate::llm_client::retry::RetryPolicy;
use crate::llm_client::{ClientConfig, DEFAULT_MODEL};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub redis_url: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_model: env_or("GEMINI_MODEL", DEFAULT_MODEL),
            gemini_base_url: env_or("GEMINI_BASE_URL", GEMINI_BASE_URL),
            redis_url: require_env("REDIS_URL")?,
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    /// Settings for the generation client. Pricing and retry policy are fixed per build.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            model: self.gemini_model.clone(),
            pricing: Pricing::GEMINI_FLASH,
            retry: RetryPolicy::default(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
