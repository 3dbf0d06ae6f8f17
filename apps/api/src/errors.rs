use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::documents::DocumentError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::Validation(format!("Invalid multipart upload: {e}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Document(e) => {
                tracing::warn!("Document error: {e}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "DOCUMENT_UNREADABLE",
                    format!("Could not read the document: {e}. Try pasting the text instead."),
                )
            }
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                llm_error_parts(e)
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// Callers need to tell "will never work" apart from "try again later".
fn llm_error_parts(e: &LlmError) -> (StatusCode, &'static str, String) {
    match e {
        LlmError::RetriesExhausted { attempts, .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            "LLM_UNAVAILABLE",
            format!("The AI service did not respond after {attempts} attempts. Please retry later."),
        ),
        LlmError::SchemaViolation(_) => (
            StatusCode::BAD_GATEWAY,
            "LLM_CONTRACT_VIOLATION",
            "The AI service returned a malformed result".to_string(),
        ),
        LlmError::InvalidRequest(msg) => (
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            msg.clone(),
        ),
        e if e.is_client_error() => (
            StatusCode::BAD_GATEWAY,
            "LLM_REJECTED",
            "The AI service rejected the request. Check the API key and configuration."
                .to_string(),
        ),
        _ => (
            StatusCode::BAD_GATEWAY,
            "LLM_ERROR",
            "An AI processing error occurred".to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_client_error_maps_to_rejected() {
        let (status, code, _) = llm_error_parts(&LlmError::Api {
            status: 401,
            message: "bad key".into(),
        });
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(code, "LLM_REJECTED");
    }

    #[test]
    fn test_exhausted_retries_maps_to_unavailable() {
        let (status, code, message) = llm_error_parts(&LlmError::RetriesExhausted {
            attempts: 3,
            source: Box::new(LlmError::EmptyContent),
        });
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(code, "LLM_UNAVAILABLE");
        assert!(message.contains('3'));
    }

    #[test]
    fn test_schema_violation_maps_to_contract_violation() {
        let (_, code, _) = llm_error_parts(&LlmError::SchemaViolation("$.x".into()));
        assert_eq!(code, "LLM_CONTRACT_VIOLATION");
    }

    #[test]
    fn test_response_statuses() {
        assert_eq!(
            status_of(AppError::Validation("empty".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(AppError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(AppError::Document(DocumentError::Empty)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
