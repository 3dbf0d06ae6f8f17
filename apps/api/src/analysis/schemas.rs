//! Output contracts for the structured analysis tasks.
//!
//! Career advice has no schema: the provider does not allow schema output together
//! with the search tool, so that task returns free text plus grounding links.

use std::sync::LazyLock;

use crate::llm_client::schema::Schema;

pub const MATCH_LEVELS: &[&str] = &["Low", "Moderate", "High", "Excellent"];

static RESUME_ANALYSIS: LazyLock<Schema> = LazyLock::new(|| {
    let ats_score = Schema::object(
        vec![
            (
                "overallScore",
                Schema::number().describe("Overall score out of 100"),
            ),
            (
                "impactScore",
                Schema::number().describe("Score for action verbs and results"),
            ),
            (
                "brevityScore",
                Schema::number().describe("Score for conciseness"),
            ),
            (
                "styleScore",
                Schema::number().describe("Score for formatting and readability"),
            ),
            (
                "sectionScore",
                Schema::number().describe("Score for section completeness"),
            ),
        ],
        &[
            "overallScore",
            "impactScore",
            "brevityScore",
            "styleScore",
            "sectionScore",
        ],
    );

    let section = Schema::object(
        vec![
            ("name", Schema::string()),
            ("completeness", Schema::number()),
            ("issues", Schema::array_of(Schema::string())),
        ],
        &[],
    );

    let parsed_content = Schema::object(
        vec![
            ("name", Schema::string()),
            ("email", Schema::string()),
            ("experienceYears", Schema::number()),
        ],
        &[],
    );

    Schema::object(
        vec![
            ("atsScore", ats_score),
            (
                "summary",
                Schema::string().describe("Executive summary of the analysis"),
            ),
            ("topSkills", Schema::array_of(Schema::string())),
            ("missingKeywords", Schema::array_of(Schema::string())),
            ("improvements", Schema::array_of(Schema::string())),
            ("sections", Schema::array_of(section)),
            ("parsedContent", parsed_content),
        ],
        &["atsScore", "summary", "topSkills", "improvements", "sections"],
    )
});

static JOB_MATCH: LazyLock<Schema> = LazyLock::new(|| {
    Schema::object(
        vec![
            ("matchPercentage", Schema::number()),
            ("matchLevel", Schema::string_enum(MATCH_LEVELS)),
            ("missingSkills", Schema::array_of(Schema::string())),
            ("matchingSkills", Schema::array_of(Schema::string())),
            ("gapAnalysis", Schema::string()),
            ("culturalFitAnalysis", Schema::string()),
        ],
        &[
            "matchPercentage",
            "matchLevel",
            "missingSkills",
            "matchingSkills",
            "gapAnalysis",
        ],
    )
});

static TAILORED_CONTENT: LazyLock<Schema> = LazyLock::new(|| {
    Schema::object(
        vec![
            ("coverLetter", Schema::string()),
            ("tailoredSummary", Schema::string()),
            ("tailoredSkills", Schema::array_of(Schema::string())),
        ],
        &["coverLetter", "tailoredSummary", "tailoredSkills"],
    )
});

pub fn resume_analysis() -> &'static Schema {
    &RESUME_ANALYSIS
}

pub fn job_match() -> &'static Schema {
    &JOB_MATCH
}

pub fn tailored_content() -> &'static Schema {
    &TAILORED_CONTENT
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_resume_analysis_required_fields() {
        let rendered = resume_analysis().to_json();
        assert_eq!(
            rendered["required"],
            json!(["atsScore", "summary", "topSkills", "improvements", "sections"])
        );
        assert_eq!(
            rendered["properties"]["atsScore"]["required"]
                .as_array()
                .unwrap()
                .len(),
            5
        );
        assert_eq!(
            rendered["properties"]["sections"]["items"]["type"],
            "OBJECT"
        );
    }

    #[test]
    fn test_job_match_level_is_enumerated() {
        let rendered = job_match().to_json();
        assert_eq!(
            rendered["properties"]["matchLevel"]["enum"],
            json!(["Low", "Moderate", "High", "Excellent"])
        );
        assert!(job_match()
            .validate(&json!({
                "matchPercentage": 70,
                "matchLevel": "Great",
                "missingSkills": [],
                "matchingSkills": [],
                "gapAnalysis": ""
            }))
            .is_err());
    }

    #[test]
    fn test_tailored_content_accepts_valid_payload() {
        let payload = json!({
            "coverLetter": "Dear team",
            "tailoredSummary": "Engineer",
            "tailoredSkills": ["Rust"]
        });
        assert!(tailored_content().validate(&payload).is_ok());
        assert!(tailored_content()
            .validate(&json!({"coverLetter": "Dear team"}))
            .is_err());
    }
}
