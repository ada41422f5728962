//! Axum route handlers for the `/api/ai` surface.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extractors::{record_id, AppJson, JsonOrDefault};
use crate::generation::action_items::suggest_action_items;
use crate::generation::orchestrator::{
    generate_demo, generate_for_owner, DemoResume, GenerateOutcome, GenerateResumeRequest,
    TransientResume,
};
use crate::model_gateway::ModelDescriptor;
use crate::models::api::ApiResponse;
use crate::models::resume::GeneratedResumeWithRelations;
use crate::state::AppState;
use crate::store::GeneratedQuery;

const GENERATED_NOT_FOUND: &str = "Generated resume not found";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItemsRequest {
    pub job_application_id: Option<String>,
    pub job_description: Option<String>,
    pub company_info: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub available: bool,
    pub model_info: Option<ModelDescriptor>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Either a stored row with its relations or a transient generation.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum GeneratedData {
    Stored(GeneratedResumeWithRelations),
    Transient(TransientResume),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedListParams {
    pub job_application_id: Option<String>,
    pub base_resume_id: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Public routes
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/ai/generate-resume
///
/// No authentication and no storage. Falls back to the template engine when
/// the model is unavailable.
pub async fn handle_generate_demo(
    State(state): State<AppState>,
    AppJson(request): AppJson<GenerateResumeRequest>,
) -> Result<Json<ApiResponse<DemoResume>>, AppError> {
    let demo = generate_demo(&state.model, request, Utc::now()).await?;
    let message = if demo.used_model {
        "Resume enhanced successfully"
    } else {
        "Resume enhanced using AI modification algorithms"
    };
    Ok(Json(ApiResponse::ok(demo).with_message(message)))
}

/// POST /api/ai/action-items
pub async fn handle_action_items(
    State(state): State<AppState>,
    JsonOrDefault(request): JsonOrDefault<ActionItemsRequest>,
) -> Json<ApiResponse<Vec<String>>> {
    debug!(
        "Action items requested for application {:?}",
        request.job_application_id
    );
    let result = suggest_action_items(
        &state.model,
        request.job_description.as_deref(),
        request.company_info.as_deref(),
    )
    .await;
    let message = if result.generated {
        "AI-generated action items"
    } else {
        "Demo action items (AI unavailable)"
    };
    Json(ApiResponse::ok(result.items).with_message(message))
}

/// GET /api/ai/status
pub async fn handle_status(State(state): State<AppState>) -> Json<ApiResponse<StatusResponse>> {
    let status = state.model.status().await;
    Json(ApiResponse::ok(StatusResponse {
        available: status.available,
        model_info: status.model_info,
        message: status.message,
        timestamp: Utc::now(),
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Authenticated routes
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/ai/generate-resume-db
///
/// 200 with the stored row when one already exists for the pair, 201 for a
/// new (or transient) generation.
pub async fn handle_generate(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    AppJson(request): AppJson<GenerateResumeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<GeneratedData>>), AppError> {
    info!(
        "Generate resume request, force_regenerate={}",
        request.force_regenerate
    );
    let outcome =
        generate_for_owner(state.store.as_ref(), &state.model, &owner, request, Utc::now())
            .await?;

    let (status, data, message) = match outcome {
        GenerateOutcome::Existing(row) => (
            StatusCode::OK,
            GeneratedData::Stored(row),
            "Resume already generated for this application",
        ),
        GenerateOutcome::Created(row) => (
            StatusCode::CREATED,
            GeneratedData::Stored(row),
            "Resume generated and saved successfully",
        ),
        GenerateOutcome::Transient(resume) => (
            StatusCode::CREATED,
            GeneratedData::Transient(resume),
            "Resume generated successfully (demo mode - not saved)",
        ),
    };
    Ok((status, Json(ApiResponse::ok(data).with_message(message))))
}

/// GET /api/ai/generated-resumes
pub async fn handle_list_generated(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Query(params): Query<GeneratedListParams>,
) -> Result<Json<ApiResponse<Vec<GeneratedResumeWithRelations>>>, AppError> {
    let job_filter = parse_filter(params.job_application_id.as_deref());
    let resume_filter = parse_filter(params.base_resume_id.as_deref());
    if matches!(job_filter, Filter::Unmatchable) || matches!(resume_filter, Filter::Unmatchable) {
        return Ok(Json(ApiResponse::ok(Vec::new())));
    }

    let query = GeneratedQuery {
        job_application_id: job_filter.id(),
        base_resume_id: resume_filter.id(),
    };
    let resumes = state.store.list_generated_resumes(&owner, query).await?;
    Ok(Json(ApiResponse::ok(resumes)))
}

/// GET /api/ai/generated-resumes/:id
pub async fn handle_get_generated(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<GeneratedResumeWithRelations>>, AppError> {
    let id = record_id(&id, GENERATED_NOT_FOUND)?;
    let resume = state
        .store
        .get_generated_resume(&owner, id)
        .await?
        .ok_or_else(|| AppError::NotFound(GENERATED_NOT_FOUND.to_string()))?;
    Ok(Json(ApiResponse::ok(resume)))
}

/// DELETE /api/ai/generated-resumes/:id
pub async fn handle_delete_generated(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = record_id(&id, GENERATED_NOT_FOUND)?;
    if !state.store.delete_generated_resume(&owner, id).await? {
        return Err(AppError::NotFound(GENERATED_NOT_FOUND.to_string()));
    }
    info!("Deleted generated resume {id}");
    Ok(Json(ApiResponse::message_only(
        "Generated resume deleted successfully",
    )))
}

enum Filter {
    Any,
    Id(Uuid),
    /// Not a UUID, so no stored row can match.
    Unmatchable,
}

fn parse_filter(raw: Option<&str>) -> Filter {
    match raw.map(str::trim) {
        None | Some("") => Filter::Any,
        Some(raw) => Uuid::parse_str(raw).map_or(Filter::Unmatchable, Filter::Id),
    }
}

impl Filter {
    fn id(&self) -> Option<Uuid> {
        match self {
            Filter::Id(id) => Some(*id),
            Filter::Any | Filter::Unmatchable => None,
        }
    }
}
