use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extractors::{record_id, AppJson};
use crate::models::api::{ApiResponse, Paginated, Pagination};
use crate::models::job_application::{
    ApplicationStatus, JobApplicationPayload, JobApplicationWithResumes,
};
use crate::state::AppState;
use crate::store::ApplicationQuery;
use crate::validation::{job_application_changes, new_job_application};

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 100;
const NOT_FOUND: &str = "Job application not found";

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListParams {
    /// Unparseable numbers fall back to the defaults; the limit is clamped.
    fn into_query(self) -> Result<ApplicationQuery, AppError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<ApplicationStatus>()
                    .map_err(|_| AppError::BadRequest("Invalid application status".to_string()))?,
            ),
        };
        let page = self
            .page
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(DEFAULT_PAGE);
        let limit = self
            .limit
            .and_then(|l| l.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);
        Ok(ApplicationQuery {
            status,
            page,
            limit,
        })
    }
}

/// GET /api/job-applications
pub async fn handle_list(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Paginated<JobApplicationWithResumes>>>, AppError> {
    let query = params.into_query()?;
    let (data, total) = state.store.list_job_applications(&owner, query).await?;
    Ok(Json(ApiResponse::ok(Paginated {
        data,
        pagination: Pagination::new(query.page, query.limit, total),
    })))
}

/// GET /api/job-applications/:id
pub async fn handle_get(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<JobApplicationWithResumes>>, AppError> {
    let id = record_id(&id, NOT_FOUND)?;
    let application = state
        .store
        .get_job_application(&owner, id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;
    Ok(Json(ApiResponse::ok(application)))
}

/// POST /api/job-applications
pub async fn handle_create(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    AppJson(payload): AppJson<JobApplicationPayload>,
) -> Result<(StatusCode, Json<ApiResponse<JobApplicationWithResumes>>), AppError> {
    let new = new_job_application(payload)?;
    state.store.ensure_user(&owner).await?;
    let created = state.store.create_job_application(&owner, new).await?;
    info!("Created job application {}", created.application.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(created).with_message("Job application created successfully")),
    ))
}

/// PUT and PATCH /api/job-applications/:id
///
/// Both are partial: absent fields keep their stored value.
pub async fn handle_update(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<JobApplicationPayload>,
) -> Result<Json<ApiResponse<JobApplicationWithResumes>>, AppError> {
    let id = record_id(&id, NOT_FOUND)?;
    let changes = job_application_changes(payload)?;
    let updated = state
        .store
        .update_job_application(&owner, id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;
    Ok(Json(
        ApiResponse::ok(updated).with_message("Job application updated successfully"),
    ))
}

/// DELETE /api/job-applications/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = record_id(&id, NOT_FOUND)?;
    if !state.store.delete_job_application(&owner, id).await? {
        return Err(AppError::NotFound(NOT_FOUND.to_string()));
    }
    info!("Deleted job application {id}");
    Ok(Json(ApiResponse::message_only(
        "Job application deleted successfully",
    )))
}
