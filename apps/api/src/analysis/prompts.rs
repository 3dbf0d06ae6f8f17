// Prompt builders for the four analysis tasks.
// Caller text is embedded as-is; the only processing is character truncation.

/// Resume text beyond this many characters is dropped from job-related prompts.
pub const RESUME_CHAR_LIMIT: usize = 15_000;
/// Job description text beyond this many characters is dropped.
pub const JOB_DESCRIPTION_CHAR_LIMIT: usize = 5_000;

/// Returns the first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

pub fn analyze_resume_prompt(resume_text: &str) -> String {
    format!(
        r#"You are an enterprise-grade ATS (Applicant Tracking System) and Senior Technical Recruiter.

TASK:
Analyze the following resume text with extreme precision.
1. Score it against modern hiring standards (FAANG/Fortune 500 level).
2. Extract structured data including candidate details.
3. Identify critical gaps in keywords, formatting, and impact metrics.

RESUME TEXT:
{resume_text}

REQUIREMENTS:
- Be critical. High scores (>85) should be reserved for exceptional resumes.
- Focus on "Show, Don't Tell" - look for quantified results (numbers, $, %).
- Identify missing hard skills based on the context of the resume."#
    )
}

pub fn match_job_prompt(resume_text: &str, job_description: &str) -> String {
    let resume_text = truncate_chars(resume_text, RESUME_CHAR_LIMIT);
    let job_description = truncate_chars(job_description, JOB_DESCRIPTION_CHAR_LIMIT);
    format!(
        r#"You are a Hiring Manager making a final decision. Compare the candidate against the Job Description.

CANDIDATE RESUME:
{resume_text}

JOB DESCRIPTION:
{job_description}

TASK:
1. Calculate a match percentage based on: Hard Skills (40%), Experience Relevance (30%), Keywords (20%), Soft Skills (10%).
2. Explicitly list missing critical skills that are present in the JD but absent in the resume.
3. Provide a gap analysis explaining why they might NOT get the interview."#
    )
}

pub fn tailor_content_prompt(resume_text: &str, job_description: &str) -> String {
    let resume_text = truncate_chars(resume_text, RESUME_CHAR_LIMIT);
    let job_description = truncate_chars(job_description, JOB_DESCRIPTION_CHAR_LIMIT);
    format!(
        r#"You are a specialized Career Coach and Professional Resume Writer.

TASK:
1. Write a compelling Cover Letter that bridges the candidate's past experience to the target role's future needs. Use a professional, confident tone.
2. Rewrite the "Professional Summary" to heavily target the keywords in the Job Description.
3. Re-order and refine the Skills section to prioritize matches.

CONTEXT:
Resume: {resume_text}
Target Job: {job_description}"#
    )
}

/// Blank skills are skipped. Blank `role` or `location` count as not given.
pub fn career_advice_prompt(
    skills: &[String],
    summary: &str,
    role: Option<&str>,
    location: Option<&str>,
) -> String {
    let role_line = match non_blank(role) {
        Some(role) => format!("Target Role: {role}"),
        None => "Roles matching the skills".to_string(),
    };
    let location_line = match non_blank(location) {
        Some(location) => format!("in {location}"),
        None => "Remote or Worldwide".to_string(),
    };
    let skills = skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    let summary_block = match summary.trim() {
        "" => String::new(),
        summary => format!("\nCandidate Summary:\n{summary}\n"),
    };

    format!(
        r#"Based on the following professional profile, find 5 relevant LIVE job openings and 3 internship opportunities.
{summary_block}
Search Criteria:
- {role_line}
- Location: {location_line}
- Candidate Skills: {skills}

Output Requirements:
1. List the jobs with Title, Company, Location and a brief description.
2. List the internships.
3. Provide a section "How to Crack It" with 3-4 specific, high-impact tips.

Use Google Search to find real, current listings."#
    )
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
