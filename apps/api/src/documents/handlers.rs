use axum::{extract::Multipart, Json};
use bytes::Bytes;
use serde::Serialize;
use tracing::info;

use crate::documents::extract_text;
use crate::errors::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    pub file_name: String,
    pub text: String,
}

/// POST /api/v1/documents/extract
///
/// Accepts a multipart upload with a `file` field and returns its plain text.
pub async fn handle_extract(mut multipart: Multipart) -> Result<Json<ExtractResponse>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data: Bytes = field.bytes().await?;
        info!("Extracting text from {} ({} bytes)", file_name, data.len());

        // PDF parsing is CPU-bound.
        let name = file_name.clone();
        let text = tokio::task::spawn_blocking(move || {
            extract_text(&name, content_type.as_deref(), &data)
        })
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

        return Ok(Json(ExtractResponse { file_name, text }));
    }

    Err(AppError::Validation(
        "multipart field 'file' is required".to_string(),
    ))
}
