//! Axum route handlers for the analysis API.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::analysis::models::{
    CareerAdviceResult, HistoryItem, JobMatchResult, ResumeAnalysisResult, TailoredContentResult,
};
use crate::analysis::tasks;
use crate::errors::AppError;
use crate::history::SavedSession;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub resume_text: String,
    /// When present, the result is saved for this session.
    #[serde(default)]
    pub session_id: Option<Uuid>,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub resume_text: String,
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerAdviceRequest {
    pub skills: Vec<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
    pub session_id: Uuid,
}

fn require_text(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resume/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<ResumeAnalysisResult>, AppError> {
    require_text(&request.resume_text, "resumeText")?;

    let analysis = tasks::analyze_resume(&state.llm, &request.resume_text).await?;

    if let Some(session_id) = request.session_id {
        state
            .history
            .save_analysis(
                session_id,
                &analysis,
                &request.resume_text,
                request.file_name.as_deref(),
            )
            .await;
    }

    Ok(Json(analysis))
}

/// GET /api/v1/resume/session?sessionId=
pub async fn handle_get_session(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<SavedSession>, AppError> {
    state
        .history
        .load_session(query.session_id)
        .await
        .map(Json)
        .ok_or_else(|| {
            AppError::NotFound(format!("No saved analysis for session {}", query.session_id))
        })
}

/// DELETE /api/v1/resume/session?sessionId=
pub async fn handle_clear_session(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> StatusCode {
    state.history.clear_session(query.session_id).await;
    StatusCode::NO_CONTENT
}

/// GET /api/v1/resume/history?sessionId=
pub async fn handle_history(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Json<Vec<HistoryItem>> {
    Json(state.history.history(query.session_id).await)
}

/// POST /api/v1/jobs/match
pub async fn handle_match_job(
    State(state): State<AppState>,
    Json(request): Json<JobRequest>,
) -> Result<Json<JobMatchResult>, AppError> {
    require_text(&request.resume_text, "resumeText")?;
    require_text(&request.job_description, "jobDescription")?;

    let result =
        tasks::match_job(&state.llm, &request.resume_text, &request.job_description).await?;
    Ok(Json(result))
}

/// POST /api/v1/jobs/tailor
pub async fn handle_tailor(
    State(state): State<AppState>,
    Json(request): Json<JobRequest>,
) -> Result<Json<TailoredContentResult>, AppError> {
    require_text(&request.resume_text, "resumeText")?;
    require_text(&request.job_description, "jobDescription")?;

    let result = tasks::generate_tailored_content(
        &state.llm,
        &request.resume_text,
        &request.job_description,
    )
    .await?;
    Ok(Json(result))
}

/// POST /api/v1/career/advice
pub async fn handle_career_advice(
    State(state): State<AppState>,
    Json(request): Json<CareerAdviceRequest>,
) -> Result<Json<CareerAdviceResult>, AppError> {
    let skills: Vec<String> = request
        .skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if skills.is_empty() {
        return Err(AppError::Validation("skills cannot be empty".to_string()));
    }

    let result = tasks::get_career_advice(
        &state.llm,
        &skills,
        &request.summary,
        request.role.as_deref(),
        request.location.as_deref(),
    )
    .await?;
    Ok(Json(result))
}
