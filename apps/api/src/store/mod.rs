//! Persistence gateway. Every operation is scoped by the owner id; a record
//! owned by someone else is indistinguishable from one that does not exist.
//!
//! `AppState` carries an `Arc<dyn Store>`: `PgStore` in production,
//! `MemoryStore` in tests or when no database is configured.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job_application::{
    ApplicationStatus, JobApplicationChanges, JobApplicationWithResumes, NewJobApplication,
};
use crate::models::resume::{
    BaseResumeChanges, BaseResumeDetail, BaseResumeRow, BaseResumeWithGenerated,
    GeneratedResumeRow, GeneratedResumeWithRelations, NewBaseResume, NewGeneratedResume,
};
use crate::models::user::User;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Filters and paging for the application list.
#[derive(Debug, Clone, Copy)]
pub struct ApplicationQuery {
    pub status: Option<ApplicationStatus>,
    pub page: u32,
    pub limit: u32,
}

impl ApplicationQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratedQuery {
    pub job_application_id: Option<Uuid>,
    pub base_resume_id: Option<Uuid>,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Creates the owner's user row on first sight; returns it either way.
    async fn ensure_user(&self, owner: &str) -> Result<User, AppError>;

    // ── Job applications ────────────────────────────────────────────────────

    /// Most recently updated first, with the total count for paging.
    async fn list_job_applications(
        &self,
        owner: &str,
        query: ApplicationQuery,
    ) -> Result<(Vec<JobApplicationWithResumes>, u64), AppError>;

    async fn get_job_application(
        &self,
        owner: &str,
        id: Uuid,
    ) -> Result<Option<JobApplicationWithResumes>, AppError>;

    async fn create_job_application(
        &self,
        owner: &str,
        new: NewJobApplication,
    ) -> Result<JobApplicationWithResumes, AppError>;

    /// `None` when the record is absent or owned by someone else.
    async fn update_job_application(
        &self,
        owner: &str,
        id: Uuid,
        changes: JobApplicationChanges,
    ) -> Result<Option<JobApplicationWithResumes>, AppError>;

    /// `false` when nothing was deleted.
    async fn delete_job_application(&self, owner: &str, id: Uuid) -> Result<bool, AppError>;

    // ── Base resumes ────────────────────────────────────────────────────────

    async fn list_base_resumes(&self, owner: &str) -> Result<Vec<BaseResumeWithGenerated>, AppError>;

    /// The most recently updated resume, which the UI treats as "the" base resume.
    async fn latest_base_resume(&self, owner: &str) -> Result<Option<BaseResumeRow>, AppError>;

    async fn get_base_resume(&self, owner: &str, id: Uuid) -> Result<Option<BaseResumeDetail>, AppError>;

    async fn create_base_resume(&self, owner: &str, new: NewBaseResume) -> Result<BaseResumeRow, AppError>;

    async fn update_base_resume(
        &self,
        owner: &str,
        id: Uuid,
        changes: BaseResumeChanges,
    ) -> Result<Option<BaseResumeRow>, AppError>;

    async fn delete_base_resume(&self, owner: &str, id: Uuid) -> Result<bool, AppError>;

    // ── Generated resumes ───────────────────────────────────────────────────

    async fn list_generated_resumes(
        &self,
        owner: &str,
        query: GeneratedQuery,
    ) -> Result<Vec<GeneratedResumeWithRelations>, AppError>;

    async fn get_generated_resume(
        &self,
        owner: &str,
        id: Uuid,
    ) -> Result<Option<GeneratedResumeWithRelations>, AppError>;

    async fn find_generated_for_pair(
        &self,
        owner: &str,
        job_application_id: Uuid,
        base_resume_id: Uuid,
    ) -> Result<Option<GeneratedResumeRow>, AppError>;

    /// Conditional insert under the (job application, base resume) uniqueness
    /// rule. Returns `None` if a row for the pair already exists.
    async fn insert_generated_resume(
        &self,
        new: NewGeneratedResume,
    ) -> Result<Option<GeneratedResumeWithRelations>, AppError>;

    async fn delete_generated_resume(&self, owner: &str, id: Uuid) -> Result<bool, AppError>;
}
