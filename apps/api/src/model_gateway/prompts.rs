// Prompt builders for the model gateway.

use super::GenerationRequest;

const NOT_SPECIFIED: &str = "Not specified";

const RESUME_INSTRUCTIONS: &str = "\
You are an expert resume writer and career coach with deep knowledge of technical \
recruiting. Rewrite the candidate's existing resume so it fits the job below.

Rules:
1. Keep the candidate's real experience and education; never invent employers, dates or degrees.
2. Rewrite the professional summary for this specific role.
3. Put the skills and experience that match the job description first.
4. Use the technical keywords of the position where the candidate's background supports them.
5. Present transferable skills from non-technical roles in development terms.
6. Return ONLY the resume text, formatted as a clean professional resume, with no commentary.";

/// The single instruction-style prompt for a resume rewrite.
pub fn resume_prompt(request: &GenerationRequest) -> String {
    format!(
        "{RESUME_INSTRUCTIONS}

JOB DETAILS:
- Company: {company}
- Position: {position}
- Location: {location}
- Salary: {salary}
- Job Description: {description}
- Custom Requirements: {custom}

CURRENT RESUME:
{resume}

Enhanced resume:
",
        company = request.company_name,
        position = request.job_title,
        location = or_default(request.location.as_deref(), NOT_SPECIFIED),
        salary = or_default(request.salary.as_deref(), NOT_SPECIFIED),
        description = or_default(
            request.job_description.as_deref(),
            "No job description provided"
        ),
        custom = or_default(
            request.custom_requirements.as_deref(),
            "No custom requirements provided"
        ),
        resume = request.base_resume,
    )
}

/// Asks for next steps in the `[priority] Title - Description (N minutes)` line format.
pub fn action_items_prompt(
    job_description: Option<&str>,
    company_info: Option<&str>,
) -> String {
    format!(
        "You are a career coach helping a candidate move a job application forward.

Job Description: {description}
Company Information: {company}

List 3 to 5 concrete next steps for this application. Write exactly one step per line \
in this format and nothing else:
[high|medium|low] Title - Description (N minutes)
",
        description = or_default(job_description, "No job description provided"),
        company = or_default(company_info, "No company information provided"),
    )
}

fn or_default<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => default,
    }
}
