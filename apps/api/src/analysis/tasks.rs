//! Task methods. Each binds a prompt, an answer mode and a temperature, then
//! delegates to the generation client.

use tracing::info;

use crate::analysis::models::{
    CareerAdviceResult, JobMatchResult, ResumeAnalysisResult, TailoredContentResult,
};
use crate::analysis::{prompts, schemas};
use crate::llm_client::{GenerationClient, LlmError, TaskRequest};

/// Low temperature keeps scoring consistent between runs.
const SCORING_TEMPERATURE: f32 = 0.1;
/// Cover letters and summaries benefit from some variation.
const CREATIVE_TEMPERATURE: f32 = 0.7;

pub async fn analyze_resume(
    llm: &GenerationClient,
    resume_text: &str,
) -> Result<ResumeAnalysisResult, LlmError> {
    info!("Analyzing resume ({} chars)", resume_text.chars().count());
    let request = TaskRequest::structured(
        prompts::analyze_resume_prompt(resume_text),
        schemas::resume_analysis(),
    )
    .with_temperature(SCORING_TEMPERATURE);
    llm.generate(&request).await
}

pub async fn match_job(
    llm: &GenerationClient,
    resume_text: &str,
    job_description: &str,
) -> Result<JobMatchResult, LlmError> {
    info!("Matching resume against job description");
    let request = TaskRequest::structured(
        prompts::match_job_prompt(resume_text, job_description),
        schemas::job_match(),
    )
    .with_temperature(SCORING_TEMPERATURE);
    llm.generate(&request).await
}

pub async fn generate_tailored_content(
    llm: &GenerationClient,
    resume_text: &str,
    job_description: &str,
) -> Result<TailoredContentResult, LlmError> {
    info!("Generating tailored content");
    let request = TaskRequest::structured(
        prompts::tailor_content_prompt(resume_text, job_description),
        schemas::tailored_content(),
    )
    .with_temperature(CREATIVE_TEMPERATURE);
    llm.generate(&request).await
}

/// Always takes the search-grounded path so cited links can be returned.
pub async fn get_career_advice(
    llm: &GenerationClient,
    skills: &[String],
    summary: &str,
    role: Option<&str>,
    location: Option<&str>,
) -> Result<CareerAdviceResult, LlmError> {
    info!("Fetching career advice for {} skills", skills.len());
    let prompt = prompts::career_advice_prompt(skills, summary, role, location);
    llm.generate_with_grounding(&prompt).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::analysis::models::MatchLevel;
    use crate::llm_client::testing::{json_reply, ScriptedEndpoint};
    use crate::llm_client::{ClientConfig, GroundingChunk, ModelResponse, ResponseMode};

    fn client(endpoint: &Arc<ScriptedEndpoint>) -> GenerationClient {
        GenerationClient::new(endpoint.clone(), ClientConfig::default())
    }

    fn analysis_json() -> String {
        json!({
            "atsScore": {
                "overallScore": 78,
                "impactScore": 70,
                "brevityScore": 85,
                "styleScore": 80,
                "sectionScore": 75
            },
            "summary": "Strong systems background, light on metrics.",
            "topSkills": ["Rust", "Distributed Systems"],
            "missingKeywords": ["Kubernetes"],
            "improvements": ["Add quantified outcomes"],
            "sections": [{"name": "Experience", "completeness": 90, "issues": []}],
            "parsedContent": {"name": "Ada", "email": "ada@example.com", "experienceYears": 6}
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_analyze_resume_uses_schema_and_low_temperature() {
        let endpoint = Arc::new(ScriptedEndpoint::new(vec![Ok(json_reply(
            &analysis_json(),
            1200,
            400,
        ))]));

        let result = analyze_resume(&client(&endpoint), "My resume")
            .await
            .unwrap();

        assert_eq!(result.data.ats_score.overall_score, 78.0);
        assert_eq!(result.data.top_skills, vec!["Rust", "Distributed Systems"]);
        assert_eq!(result.usage.input_tokens, 1200);

        let request = &endpoint.requests()[0];
        assert_eq!(request.temperature, Some(SCORING_TEMPERATURE));
        assert_eq!(
            request.mode,
            ResponseMode::StructuredJson(schemas::resume_analysis())
        );
        assert!(request.prompt.contains("My resume"));
    }

    #[tokio::test]
    async fn test_analyze_resume_missing_required_field_fails() {
        let endpoint = Arc::new(ScriptedEndpoint::new(vec![Ok(json_reply(
            r#"{"summary": "no scores"}"#,
            10,
            10,
        ))]));

        let err = analyze_resume(&client(&endpoint), "My resume")
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::SchemaViolation(ref m) if m.contains("atsScore")));
    }

    #[tokio::test]
    async fn test_analyze_resume_null_optional_field_is_accepted() {
        let mut body: serde_json::Value = serde_json::from_str(&analysis_json()).unwrap();
        body["missingKeywords"] = serde_json::Value::Null;
        let endpoint = Arc::new(ScriptedEndpoint::new(vec![Ok(json_reply(
            &body.to_string(),
            10,
            10,
        ))]));

        let result = analyze_resume(&client(&endpoint), "My resume")
            .await
            .unwrap();

        assert!(result.data.missing_keywords.is_empty());
        assert_eq!(endpoint.calls(), 1);
    }

    #[tokio::test]
    async fn test_match_job_parses_match_level() {
        let body = json!({
            "matchPercentage": 64,
            "matchLevel": "Moderate",
            "missingSkills": ["Kafka"],
            "matchingSkills": ["Rust"],
            "gapAnalysis": "No streaming experience."
        })
        .to_string();
        let endpoint = Arc::new(ScriptedEndpoint::new(vec![Ok(json_reply(&body, 50, 50))]));

        let result = match_job(&client(&endpoint), "resume", "job")
            .await
            .unwrap();

        assert_eq!(result.data.match_level, MatchLevel::Moderate);
        assert_eq!(result.data.missing_skills, vec!["Kafka"]);
        assert!(result.data.cultural_fit_analysis.is_none());
        assert_eq!(endpoint.requests()[0].temperature, Some(SCORING_TEMPERATURE));
    }

    #[tokio::test]
    async fn test_tailored_content_uses_creative_temperature() {
        let body = json!({
            "coverLetter": "Dear hiring team,",
            "tailoredSummary": "Backend engineer focused on reliability.",
            "tailoredSkills": ["Rust", "Go"]
        })
        .to_string();
        let endpoint = Arc::new(ScriptedEndpoint::new(vec![Ok(json_reply(&body, 50, 300))]));

        let result = generate_tailored_content(&client(&endpoint), "resume", "job")
            .await
            .unwrap();

        assert_eq!(result.data.tailored_skills, vec!["Rust", "Go"]);
        assert_eq!(
            endpoint.requests()[0].temperature,
            Some(CREATIVE_TEMPERATURE)
        );
    }

    #[tokio::test]
    async fn test_career_advice_routes_to_grounded_path() {
        let chunks: Vec<GroundingChunk> = serde_json::from_value(json!([
            {"web": {"uri": "https://jobs.example.com/1", "title": "Platform Engineer"}}
        ]))
        .unwrap();
        let endpoint = Arc::new(ScriptedEndpoint::new(vec![Ok(ModelResponse {
            text: Some("1. Platform Engineer at Example".into()),
            usage: None,
            grounding_chunks: chunks,
        })]));

        let skills = vec!["Rust".to_string()];
        let result = get_career_advice(
            &client(&endpoint),
            &skills,
            "Engineer",
            Some("Platform Engineer"),
            None,
        )
        .await
        .unwrap();

        assert_eq!(result.data.links.len(), 1);
        assert_eq!(result.data.links[0].title, "Platform Engineer");

        let request = &endpoint.requests()[0];
        assert_eq!(request.mode, ResponseMode::SearchGrounded);
        assert!(request.prompt.contains("Target Role: Platform Engineer"));
    }
}
