//! Generate-resume orchestration for the authenticated and public routes.
//!
//! The authenticated flow resolves the resume text and job context for the
//! caller, decides whether the request targets real records, and only then
//! persists. Ids carrying the demo prefix (or that are not UUIDs) never reach
//! storage.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::fallback::fallback_generate;
use crate::model_gateway::{GenerationRequest, ModelDescriptor, ModelGateway};
use crate::models::resume::{GeneratedResumeWithRelations, NewGeneratedResume};
use crate::store::Store;
use crate::validation::{validate_demo_generate_request, validate_generate_request};

pub const DEMO_ID_PREFIX: &str = "demo-";
const NOT_SPECIFIED: &str = "Not specified";

// ────────────────────────────────────────────────────────────────────────────
// Request / outcome types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResumeRequest {
    pub job_application_id: Option<String>,
    pub base_resume_id: Option<String>,
    pub job_description: Option<String>,
    pub custom_requirements: Option<String>,
    pub base_resume_content: Option<String>,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    #[serde(default)]
    pub force_regenerate: bool,
}

/// A generation that was not written to storage.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransientResume {
    pub id: String,
    pub content: String,
    pub job_title: String,
    pub company_name: String,
    pub customizations: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum GenerateOutcome {
    /// A row already existed for the pair and regeneration was not forced.
    Existing(GeneratedResumeWithRelations),
    Created(GeneratedResumeWithRelations),
    Transient(TransientResume),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoResume {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub job_application_id: Option<String>,
    pub base_resume_id: Option<String>,
    pub model_info: Option<ModelDescriptor>,
    /// Milliseconds spent producing `content`.
    pub processing_time: u64,
    pub customizations: String,
    #[serde(skip)]
    pub used_model: bool,
}

/// `None` for demo-prefixed or malformed ids.
pub fn persisted_id(raw: Option<&str>) -> Option<Uuid> {
    let raw = raw?.trim();
    if raw.starts_with(DEMO_ID_PREFIX) {
        return None;
    }
    Uuid::parse_str(raw).ok()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Authenticated flow
// ────────────────────────────────────────────────────────────────────────────

/// Generates a resume for `owner`, persisting it when both referenced records
/// exist and belong to the caller.
pub async fn generate_for_owner(
    store: &dyn Store,
    gateway: &ModelGateway,
    owner: &str,
    request: GenerateResumeRequest,
    now: DateTime<Utc>,
) -> Result<GenerateOutcome, AppError> {
    validate_generate_request(
        request.job_application_id.as_deref().unwrap_or_default(),
        request.base_resume_id.as_deref().unwrap_or_default(),
        request.custom_requirements.as_deref(),
    )
    .into_result()?;

    let job_id = persisted_id(request.job_application_id.as_deref());
    let resume_id = persisted_id(request.base_resume_id.as_deref());

    let base_resume = match resume_id {
        Some(id) => store.get_base_resume(owner, id).await?,
        None => None,
    };
    let resume_text = match non_blank(request.base_resume_content.as_deref()) {
        Some(inline) => inline.to_string(),
        None => match &base_resume {
            Some(detail) => detail.resume.content.clone(),
            None => {
                return Err(AppError::BadRequest(
                    "Base resume not found and no resume content provided".to_string(),
                ))
            }
        },
    };

    let application = match job_id {
        Some(id) => store.get_job_application(owner, id).await?,
        None => None,
    };
    let application = application.map(|a| a.application);

    let job = match &application {
        Some(app) => GenerationRequest {
            base_resume: resume_text,
            job_title: app.job_title.clone(),
            company_name: app.company_name.clone(),
            job_description: non_blank(request.job_description.as_deref())
                .map(str::to_string)
                .or_else(|| app.job_description.clone()),
            custom_requirements: request.custom_requirements.clone(),
            location: app.location.clone(),
            salary: app.salary.clone(),
        },
        None => GenerationRequest {
            base_resume: resume_text,
            job_title: non_blank(request.job_title.as_deref())
                .unwrap_or(NOT_SPECIFIED)
                .to_string(),
            company_name: non_blank(request.company_name.as_deref())
                .unwrap_or(NOT_SPECIFIED)
                .to_string(),
            job_description: request.job_description.clone(),
            custom_requirements: request.custom_requirements.clone(),
            location: request.location.clone(),
            salary: request.salary.clone(),
        },
    };

    let pair = match (&application, &base_resume) {
        (Some(app), Some(resume)) => Some((app.id, resume.resume.id)),
        _ => None,
    };

    let mut superseded = None;
    if let Some((job_id, resume_id)) = pair {
        if let Some(existing) = store.find_generated_for_pair(owner, job_id, resume_id).await? {
            if !request.force_regenerate {
                if let Some(full) = store.get_generated_resume(owner, existing.id).await? {
                    info!("Returning existing generated resume {}", existing.id);
                    return Ok(GenerateOutcome::Existing(full));
                }
            } else {
                superseded = Some(existing.id);
            }
        }
    }

    let status = gateway.status().await;
    if !status.available {
        return Err(AppError::ServiceUnavailable(status.message));
    }

    let generation = gateway
        .generate(&job)
        .await
        .map_err(|e| AppError::GenerationFailed(format!("Resume generation failed: {e}")))?;

    let Some((job_application_id, base_resume_id)) = pair else {
        return Ok(GenerateOutcome::Transient(TransientResume {
            id: format!("temp-{}", now.timestamp_millis()),
            content: generation.content,
            job_title: job.job_title,
            company_name: job.company_name,
            customizations: generation.customizations,
            created_at: now,
        }));
    };

    // The old row goes only once a replacement exists.
    if let Some(old) = superseded {
        store.delete_generated_resume(owner, old).await?;
        info!("Deleted generated resume {old} for regeneration");
    }

    store.ensure_user(owner).await?;
    let inserted = store
        .insert_generated_resume(NewGeneratedResume {
            user_id: owner.to_string(),
            job_application_id,
            base_resume_id,
            content: generation.content,
            job_title: job.job_title,
            company_name: job.company_name,
            customizations: Some(generation.customizations),
        })
        .await?;

    match inserted {
        Some(created) => {
            info!("Saved generated resume {}", created.generated.id);
            Ok(GenerateOutcome::Created(created))
        }
        None => {
            warn!("Concurrent generation for the same pair; returning the stored row");
            let existing = store
                .find_generated_for_pair(owner, job_application_id, base_resume_id)
                .await?
                .ok_or_else(|| AppError::Conflict("Resource already exists".to_string()))?;
            store
                .get_generated_resume(owner, existing.id)
                .await?
                .map(GenerateOutcome::Existing)
                .ok_or_else(|| AppError::Conflict("Resource already exists".to_string()))
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Public demo flow
// ────────────────────────────────────────────────────────────────────────────

/// Never reads or writes storage. Uses the model when it is available and the
/// template fallback otherwise.
pub async fn generate_demo(
    gateway: &ModelGateway,
    request: GenerateResumeRequest,
    now: DateTime<Utc>,
) -> Result<DemoResume, AppError> {
    let Some(content) = non_blank(request.base_resume_content.as_deref()) else {
        return Err(AppError::BadRequest(
            "Base resume content is required for AI modification".to_string(),
        ));
    };
    validate_demo_generate_request(request.custom_requirements.as_deref()).into_result()?;

    let started = Instant::now();
    let status = gateway.status().await;

    let content = if status.available {
        let job = GenerationRequest {
            base_resume: content.to_string(),
            job_title: non_blank(request.job_title.as_deref())
                .unwrap_or(NOT_SPECIFIED)
                .to_string(),
            company_name: non_blank(request.company_name.as_deref())
                .unwrap_or(NOT_SPECIFIED)
                .to_string(),
            job_description: request.job_description.clone(),
            custom_requirements: request.custom_requirements.clone(),
            location: request.location.clone(),
            salary: request.salary.clone(),
        };
        gateway
            .generate(&job)
            .await
            .map_err(|e| AppError::GenerationFailed(format!("Resume generation failed: {e}")))?
            .content
    } else {
        fallback_generate(
            content,
            request.job_description.as_deref(),
            request.custom_requirements.as_deref(),
            now.date_naive(),
        )
    };

    let tailored = non_blank(request.job_description.as_deref()).is_some()
        || non_blank(request.custom_requirements.as_deref()).is_some();

    Ok(DemoResume {
        id: format!("modified-{}", now.timestamp_millis()),
        content,
        created_at: now,
        job_application_id: request.job_application_id,
        base_resume_id: request.base_resume_id,
        model_info: status.model_info,
        processing_time: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        customizations: if tailored {
            "Enhanced based on job requirements and your actual experience"
        } else {
            "Minor enhancements to original resume"
        }
        .to_string(),
        used_model: status.available,
    })
}
