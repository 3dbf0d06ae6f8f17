use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::llm_client::Generated;

pub use crate::llm_client::GroundedOutput as CareerAdvice;

/// Optional schema fields may come back as explicit `null`; read that as the default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Scores are 0–100 by convention; the model is not forced to stay in range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtsScore {
    pub overall_score: f64,
    pub impact_score: f64,
    pub brevity_score: f64,
    pub style_score: f64,
    pub section_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completeness: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedContent {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub experience_years: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeAnalysis {
    pub ats_score: AtsScore,
    pub summary: String,
    pub top_skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub missing_keywords: Vec<String>,
    pub improvements: Vec<String>,
    pub sections: Vec<ResumeSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_content: Option<ParsedContent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchLevel {
    Low,
    Moderate,
    High,
    Excellent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMatch {
    pub match_percentage: f64,
    pub match_level: MatchLevel,
    pub missing_skills: Vec<String>,
    pub matching_skills: Vec<String>,
    pub gap_analysis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cultural_fit_analysis: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TailoredContent {
    pub cover_letter: String,
    pub tailored_summary: String,
    pub tailored_skills: Vec<String>,
}

pub type ResumeAnalysisResult = Generated<ResumeAnalysis>;
pub type JobMatchResult = Generated<JobMatch>;
pub type TailoredContentResult = Generated<TailoredContent>;
pub type CareerAdviceResult = Generated<CareerAdvice>;

/// One past analysis, as listed in a session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub file_name: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_role: Option<String>,
}
