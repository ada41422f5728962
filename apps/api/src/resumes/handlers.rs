use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extractors::{record_id, AppJson};
use crate::models::api::ApiResponse;
use crate::models::resume::{BaseResumeDetail, BaseResumePayload, BaseResumeRow, BaseResumeWithGenerated};
use crate::state::AppState;
use crate::validation::{base_resume_changes, new_base_resume};

const NOT_FOUND: &str = "Resume not found";

/// GET /api/resumes
pub async fn handle_list(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
) -> Result<Json<ApiResponse<Vec<BaseResumeWithGenerated>>>, AppError> {
    let resumes = state.store.list_base_resumes(&owner).await?;
    Ok(Json(ApiResponse::ok(resumes)))
}

/// GET /api/resumes/base
///
/// The most recently updated resume, or `data: null` when the owner has none.
pub async fn handle_get_base(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
) -> Result<Json<ApiResponse<Option<BaseResumeRow>>>, AppError> {
    let latest = state.store.latest_base_resume(&owner).await?;
    Ok(Json(ApiResponse::ok(latest)))
}

/// GET /api/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BaseResumeDetail>>, AppError> {
    let id = record_id(&id, NOT_FOUND)?;
    let resume = state
        .store
        .get_base_resume(&owner, id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;
    Ok(Json(ApiResponse::ok(resume)))
}

/// POST /api/resumes
pub async fn handle_create(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    AppJson(payload): AppJson<BaseResumePayload>,
) -> Result<(StatusCode, Json<ApiResponse<BaseResumeRow>>), AppError> {
    let new = new_base_resume(payload)?;
    state.store.ensure_user(&owner).await?;
    let created = state.store.create_base_resume(&owner, new).await?;
    info!("Created base resume {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(created).with_message("Resume created successfully")),
    ))
}

/// PUT /api/resumes/:id
pub async fn handle_update(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<BaseResumePayload>,
) -> Result<Json<ApiResponse<BaseResumeRow>>, AppError> {
    let id = record_id(&id, NOT_FOUND)?;
    let changes = base_resume_changes(payload)?;
    let updated = state
        .store
        .update_base_resume(&owner, id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;
    Ok(Json(ApiResponse::ok(updated).with_message("Resume updated successfully")))
}

/// DELETE /api/resumes/:id
///
/// Generated resumes built from this one are removed with it.
pub async fn handle_delete(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = record_id(&id, NOT_FOUND)?;
    if !state.store.delete_base_resume(&owner, id).await? {
        return Err(AppError::NotFound(NOT_FOUND.to_string()));
    }
    info!("Deleted base resume {id}");
    Ok(Json(ApiResponse::message_only("Resume deleted successfully")))
}
