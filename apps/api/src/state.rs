use crate::history::HistoryStore;
use crate::llm_client::GenerationClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub llm: GenerationClient,
    /// Best-effort session persistence. Failures never reach the caller.
    pub history: HistoryStore,
}
