//! Field-level request validation for job applications, base resumes and
//! generation requests.
//!
//! Validators are pure: they return every violation found rather than stopping
//! at the first. Handlers turn a failed result into `AppError::Validation`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::job_application::{
    ApplicationStatus, JobApplicationChanges, JobApplicationPayload, NewJobApplication,
};
use crate::models::resume::{BaseResumeChanges, BaseResumePayload, NewBaseResume};

const COMPANY_NAME_MAX: usize = 200;
const JOB_TITLE_MAX: usize = 200;
const LOCATION_MAX: usize = 200;
const SALARY_MAX: usize = 100;
const NOTES_MAX: usize = 5_000;
const JOB_DESCRIPTION_MAX: usize = 10_000;
const RESUME_NAME_MAX: usize = 200;
const RESUME_CONTENT_MIN: usize = 10;
const RESUME_CONTENT_MAX: usize = 50_000;
const CUSTOM_REQUIREMENTS_MAX: usize = 1_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<FieldError>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<FieldError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Converts a failed result into the 400 error handlers return.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.valid {
            Ok(())
        } else {
            Err(AppError::Validation {
                message: format_validation_errors(&self.errors),
                errors: self.errors,
            })
        }
    }
}

/// `field: message, field: message`
pub fn format_validation_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_application_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Absolute http(s) URL. The empty string means "not provided" and passes.
pub fn is_valid_url(raw: &str) -> bool {
    if raw.is_empty() {
        return true;
    }
    match reqwest::Url::parse(raw) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
        Err(_) => false,
    }
}

/// Checks a required string: missing/blank on create is an error, blank on
/// update is an error, absent on update is skipped.
fn check_required(
    errors: &mut Vec<FieldError>,
    value: Option<&str>,
    is_update: bool,
    field: &str,
    label: &str,
    max: usize,
) {
    match value {
        None if is_update => {}
        None => errors.push(FieldError::new(field, &format!("{label} is required"))),
        Some(v) if v.trim().is_empty() => {
            errors.push(FieldError::new(field, &format!("{label} is required")))
        }
        Some(v) if char_len(v) > max => {
            errors.push(FieldError::new(field, &format!("{label} is too long")))
        }
        Some(_) => {}
    }
}

fn check_max(errors: &mut Vec<FieldError>, value: Option<&str>, field: &str, message: &str, max: usize) {
    if let Some(v) = value {
        if char_len(v) > max {
            errors.push(FieldError::new(field, message));
        }
    }
}

pub fn validate_job_application(data: &JobApplicationPayload, is_update: bool) -> ValidationResult {
    let mut errors = Vec::new();

    check_required(
        &mut errors,
        data.company_name.as_deref(),
        is_update,
        "companyName",
        "Company name",
        COMPANY_NAME_MAX,
    );
    check_required(
        &mut errors,
        data.job_title.as_deref(),
        is_update,
        "jobTitle",
        "Job title",
        JOB_TITLE_MAX,
    );

    match data.application_date.as_deref() {
        None if is_update => {}
        None => errors.push(FieldError::new("applicationDate", "Application date is required")),
        Some(raw) if raw.trim().is_empty() => {
            errors.push(FieldError::new("applicationDate", "Application date is required"))
        }
        Some(raw) => {
            if parse_application_date(raw).is_none() {
                errors.push(FieldError::new("applicationDate", "Invalid date format"));
            }
        }
    }

    if let Some(status) = data.status.as_deref() {
        if status.parse::<ApplicationStatus>().is_err() {
            errors.push(FieldError::new("status", "Invalid application status"));
        }
    }

    check_max(&mut errors, data.location.as_deref(), "location", "Location is too long", LOCATION_MAX);

    if let Some(link) = data.job_posting_link.as_deref() {
        if !is_valid_url(link) {
            errors.push(FieldError::new("jobPostingLink", "Invalid URL format"));
        }
    }

    check_max(&mut errors, data.salary.as_deref(), "salary", "Salary is too long", SALARY_MAX);
    check_max(&mut errors, data.notes.as_deref(), "notes", "Notes are too long", NOTES_MAX);
    check_max(
        &mut errors,
        data.job_description.as_deref(),
        "jobDescription",
        "Job description is too long",
        JOB_DESCRIPTION_MAX,
    );

    ValidationResult::from_errors(errors)
}

pub fn validate_base_resume(data: &BaseResumePayload, is_update: bool) -> ValidationResult {
    let mut errors = Vec::new();

    check_required(
        &mut errors,
        data.name.as_deref(),
        is_update,
        "name",
        "Resume name",
        RESUME_NAME_MAX,
    );

    match data.content.as_deref() {
        None if is_update => {}
        None => errors.push(FieldError::new("content", "Resume content is required")),
        Some(c) if c.trim().is_empty() => {
            errors.push(FieldError::new("content", "Resume content is required"))
        }
        Some(c) if char_len(c) < RESUME_CONTENT_MIN => {
            errors.push(FieldError::new("content", "Resume content is too short"))
        }
        Some(c) if char_len(c) > RESUME_CONTENT_MAX => errors.push(FieldError::new(
            "content",
            "Resume content is too long (max 50,000 characters)",
        )),
        Some(_) => {}
    }

    ValidationResult::from_errors(errors)
}

pub fn validate_generate_request(
    job_application_id: &str,
    base_resume_id: &str,
    custom_requirements: Option<&str>,
) -> ValidationResult {
    let mut errors = Vec::new();

    if job_application_id.trim().is_empty() {
        errors.push(FieldError::new("jobApplicationId", "Job application ID is required"));
    }
    if base_resume_id.trim().is_empty() {
        errors.push(FieldError::new("baseResumeId", "Base resume ID is required"));
    }
    check_max(
        &mut errors,
        custom_requirements,
        "customRequirements",
        "Custom requirements are too long (max 1,000 characters)",
        CUSTOM_REQUIREMENTS_MAX,
    );

    ValidationResult::from_errors(errors)
}

/// The public demo route takes no ids; only the free-text bound applies.
pub fn validate_demo_generate_request(custom_requirements: Option<&str>) -> ValidationResult {
    let mut errors = Vec::new();
    check_max(
        &mut errors,
        custom_requirements,
        "customRequirements",
        "Custom requirements are too long (max 1,000 characters)",
        CUSTOM_REQUIREMENTS_MAX,
    );
    ValidationResult::from_errors(errors)
}

/// Optional free text: blank means "not provided".
fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn invalid_field(field: &str, message: &str) -> AppError {
    let errors = vec![FieldError::new(field, message)];
    AppError::Validation {
        message: format_validation_errors(&errors),
        errors,
    }
}

fn parse_status(raw: Option<String>) -> Result<Option<ApplicationStatus>, AppError> {
    raw.map(|s| s.parse::<ApplicationStatus>())
        .transpose()
        .map_err(|_| invalid_field("status", "Invalid application status"))
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>, AppError> {
    parse_application_date(raw).ok_or_else(|| invalid_field("applicationDate", "Invalid date format"))
}

/// Validates a create payload and builds the insert. Status defaults to OPENING.
pub fn new_job_application(payload: JobApplicationPayload) -> Result<NewJobApplication, AppError> {
    validate_job_application(&payload, false).into_result()?;

    let application_date = parse_date(payload.application_date.as_deref().unwrap_or_default())?;
    Ok(NewJobApplication {
        company_name: payload.company_name.unwrap_or_default(),
        job_title: payload.job_title.unwrap_or_default(),
        application_date,
        status: parse_status(payload.status)?.unwrap_or_default(),
        location: blank_to_none(payload.location),
        job_posting_link: blank_to_none(payload.job_posting_link),
        salary: blank_to_none(payload.salary),
        notes: blank_to_none(payload.notes),
        job_description: blank_to_none(payload.job_description),
    })
}

/// Validates an update payload and builds the change set.
pub fn job_application_changes(payload: JobApplicationPayload) -> Result<JobApplicationChanges, AppError> {
    validate_job_application(&payload, true).into_result()?;

    let application_date = payload
        .application_date
        .as_deref()
        .map(parse_date)
        .transpose()?;
    Ok(JobApplicationChanges {
        company_name: payload.company_name,
        job_title: payload.job_title,
        application_date,
        status: parse_status(payload.status)?,
        location: payload.location.map(|v| blank_to_none(Some(v))),
        job_posting_link: payload.job_posting_link.map(|v| blank_to_none(Some(v))),
        salary: payload.salary.map(|v| blank_to_none(Some(v))),
        notes: payload.notes.map(|v| blank_to_none(Some(v))),
        job_description: payload.job_description.map(|v| blank_to_none(Some(v))),
    })
}

pub fn new_base_resume(payload: BaseResumePayload) -> Result<NewBaseResume, AppError> {
    validate_base_resume(&payload, false).into_result()?;
    Ok(NewBaseResume {
        name: payload.name.unwrap_or_default(),
        content: payload.content.unwrap_or_default(),
    })
}

pub fn base_resume_changes(payload: BaseResumePayload) -> Result<BaseResumeChanges, AppError> {
    validate_base_resume(&payload, true).into_result()?;
    Ok(BaseResumeChanges {
        name: payload.name,
        content: payload.content,
    })
}
