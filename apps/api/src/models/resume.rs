use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::job_application::JobApplicationRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BaseResumeRow {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A resume customized for one (job application, base resume) pair.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedResumeRow {
    pub id: Uuid,
    pub user_id: String,
    pub job_application_id: Uuid,
    pub base_resume_id: Uuid,
    pub content: String,
    pub job_title: String,
    pub company_name: String,
    pub customizations: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseResumeWithGenerated {
    #[serde(flatten)]
    pub resume: BaseResumeRow,
    pub generated_resumes: Vec<GeneratedResumeRow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedResumeWithApplication {
    #[serde(flatten)]
    pub generated: GeneratedResumeRow,
    pub job_application: JobApplicationRow,
}

/// Single-resume view: generated resumes carry the application they target.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseResumeDetail {
    #[serde(flatten)]
    pub resume: BaseResumeRow,
    pub generated_resumes: Vec<GeneratedResumeWithApplication>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedResumeWithRelations {
    #[serde(flatten)]
    pub generated: GeneratedResumeRow,
    pub job_application: JobApplicationRow,
    pub base_resume: BaseResumeRow,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseResumePayload {
    pub name: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewBaseResume {
    pub name: String,
    pub content: String,
}

impl NewBaseResume {
    pub fn into_row(self, user_id: &str, now: DateTime<Utc>) -> BaseResumeRow {
        BaseResumeRow {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            name: self.name,
            content: self.content,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BaseResumeChanges {
    pub name: Option<String>,
    pub content: Option<String>,
}

impl BaseResumeChanges {
    pub fn apply(self, row: &mut BaseResumeRow, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            row.name = name;
        }
        if let Some(content) = self.content {
            row.content = content;
        }
        row.updated_at = now;
    }
}

#[derive(Debug, Clone)]
pub struct NewGeneratedResume {
    pub user_id: String,
    pub job_application_id: Uuid,
    pub base_resume_id: Uuid,
    pub content: String,
    pub job_title: String,
    pub company_name: String,
    pub customizations: Option<String>,
}

impl NewGeneratedResume {
    pub fn into_row(self, now: DateTime<Utc>) -> GeneratedResumeRow {
        GeneratedResumeRow {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            job_application_id: self.job_application_id,
            base_resume_id: self.base_resume_id,
            content: self.content,
            job_title: self.job_title,
            company_name: self.company_name,
            customizations: self.customizations,
            created_at: now,
            updated_at: now,
        }
    }
}
