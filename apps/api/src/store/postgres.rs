use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{ApplicationQuery, GeneratedQuery, Store};
use crate::errors::AppError;
use crate::models::job_application::{
    JobApplicationChanges, JobApplicationRow, JobApplicationWithResumes, NewJobApplication,
};
use crate::models::resume::{
    BaseResumeChanges, BaseResumeDetail, BaseResumeRow, BaseResumeWithGenerated,
    GeneratedResumeRow, GeneratedResumeWithApplication, GeneratedResumeWithRelations,
    NewBaseResume, NewGeneratedResume,
};
use crate::models::user::User;

const APPLICATION_COLUMNS: &str = "id, user_id, company_name, job_title, application_date, status, \
    location, job_posting_link, salary, notes, job_description, created_at, updated_at";
const RESUME_COLUMNS: &str = "id, user_id, name, content, created_at, updated_at";
const GENERATED_COLUMNS: &str = "id, user_id, job_application_id, base_resume_id, content, \
    job_title, company_name, customizations, created_at, updated_at";

/// Creates a PostgreSQL connection pool and applies pending migrations.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")?;
    info!("PostgreSQL connection pool established");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("run database migrations")?;
    info!("Database migrations applied");

    Ok(pool)
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_application(&self, owner: &str, id: Uuid) -> Result<Option<JobApplicationRow>, AppError> {
        let row = sqlx::query_as::<_, JobApplicationRow>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM job_applications WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn fetch_resume(&self, owner: &str, id: Uuid) -> Result<Option<BaseResumeRow>, AppError> {
        let row = sqlx::query_as::<_, BaseResumeRow>(&format!(
            "SELECT {RESUME_COLUMNS} FROM base_resumes WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Generated resumes for a set of applications, grouped per application,
    /// newest first.
    async fn generated_by_application(
        &self,
        application_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<GeneratedResumeRow>>, AppError> {
        let mut grouped: HashMap<Uuid, Vec<GeneratedResumeRow>> = HashMap::new();
        if application_ids.is_empty() {
            return Ok(grouped);
        }

        let rows = sqlx::query_as::<_, GeneratedResumeRow>(&format!(
            "SELECT {GENERATED_COLUMNS} FROM generated_resumes \
             WHERE job_application_id = ANY($1) ORDER BY created_at DESC"
        ))
        .bind(application_ids)
        .fetch_all(&self.pool)
        .await?;

        for row in rows {
            grouped.entry(row.job_application_id).or_default().push(row);
        }
        Ok(grouped)
    }

    async fn with_resumes(&self, application: JobApplicationRow) -> Result<JobApplicationWithResumes, AppError> {
        let mut grouped = self.generated_by_application(&[application.id]).await?;
        let generated_resumes = grouped.remove(&application.id).unwrap_or_default();
        Ok(JobApplicationWithResumes {
            application,
            generated_resumes,
        })
    }

    /// Loads both parents for each generated row. Rows whose parents vanished
    /// between queries are dropped.
    async fn with_relations(
        &self,
        rows: Vec<GeneratedResumeRow>,
    ) -> Result<Vec<GeneratedResumeWithRelations>, AppError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let application_ids: Vec<Uuid> = rows.iter().map(|r| r.job_application_id).collect();
        let resume_ids: Vec<Uuid> = rows.iter().map(|r| r.base_resume_id).collect();

        let applications: HashMap<Uuid, JobApplicationRow> =
            sqlx::query_as::<_, JobApplicationRow>(&format!(
                "SELECT {APPLICATION_COLUMNS} FROM job_applications WHERE id = ANY($1)"
            ))
            .bind(&application_ids)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        let resumes: HashMap<Uuid, BaseResumeRow> = sqlx::query_as::<_, BaseResumeRow>(&format!(
            "SELECT {RESUME_COLUMNS} FROM base_resumes WHERE id = ANY($1)"
        ))
        .bind(&resume_ids)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|r| (r.id, r))
        .collect();

        Ok(rows
            .into_iter()
            .filter_map(|generated| {
                let job_application = applications.get(&generated.job_application_id)?.clone();
                let base_resume = resumes.get(&generated.base_resume_id)?.clone();
                Some(GeneratedResumeWithRelations {
                    generated,
                    job_application,
                    base_resume,
                })
            })
            .collect())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ensure_user(&self, owner: &str) -> Result<User, AppError> {
        let placeholder = User::placeholder(owner, Utc::now());
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&placeholder.id)
        .bind(&placeholder.email)
        .bind(&placeholder.name)
        .bind(placeholder.created_at)
        .bind(placeholder.updated_at)
        .execute(&self.pool)
        .await?;

        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_job_applications(
        &self,
        owner: &str,
        query: ApplicationQuery,
    ) -> Result<(Vec<JobApplicationWithResumes>, u64), AppError> {
        let applications = sqlx::query_as::<_, JobApplicationRow>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM job_applications \
             WHERE user_id = $1 AND ($2::application_status IS NULL OR status = $2) \
             ORDER BY updated_at DESC LIMIT $3 OFFSET $4"
        ))
        .bind(owner)
        .bind(query.status)
        .bind(i64::from(query.limit))
        .bind(query.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM job_applications \
             WHERE user_id = $1 AND ($2::application_status IS NULL OR status = $2)",
        )
        .bind(owner)
        .bind(query.status)
        .fetch_one(&self.pool)
        .await?;

        let ids: Vec<Uuid> = applications.iter().map(|a| a.id).collect();
        let mut grouped = self.generated_by_application(&ids).await?;
        let items = applications
            .into_iter()
            .map(|application| JobApplicationWithResumes {
                generated_resumes: grouped.remove(&application.id).unwrap_or_default(),
                application,
            })
            .collect();

        Ok((items, total.max(0) as u64))
    }

    async fn get_job_application(
        &self,
        owner: &str,
        id: Uuid,
    ) -> Result<Option<JobApplicationWithResumes>, AppError> {
        match self.fetch_application(owner, id).await? {
            Some(application) => Ok(Some(self.with_resumes(application).await?)),
            None => Ok(None),
        }
    }

    async fn create_job_application(
        &self,
        owner: &str,
        new: NewJobApplication,
    ) -> Result<JobApplicationWithResumes, AppError> {
        let row = new.into_row(owner, Utc::now());
        let application = sqlx::query_as::<_, JobApplicationRow>(&format!(
            r#"
            INSERT INTO job_applications
                (id, user_id, company_name, job_title, application_date, status,
                 location, job_posting_link, salary, notes, job_description,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {APPLICATION_COLUMNS}
            "#
        ))
        .bind(row.id)
        .bind(&row.user_id)
        .bind(&row.company_name)
        .bind(&row.job_title)
        .bind(row.application_date)
        .bind(row.status)
        .bind(&row.location)
        .bind(&row.job_posting_link)
        .bind(&row.salary)
        .bind(&row.notes)
        .bind(&row.job_description)
        .bind(row.created_at)
        .bind(row.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(JobApplicationWithResumes {
            application,
            generated_resumes: Vec::new(),
        })
    }

    async fn update_job_application(
        &self,
        owner: &str,
        id: Uuid,
        changes: JobApplicationChanges,
    ) -> Result<Option<JobApplicationWithResumes>, AppError> {
        let Some(mut row) = self.fetch_application(owner, id).await? else {
            return Ok(None);
        };
        changes.apply(&mut row, Utc::now());

        let updated = sqlx::query_as::<_, JobApplicationRow>(&format!(
            r#"
            UPDATE job_applications
            SET company_name = $3, job_title = $4, application_date = $5, status = $6,
                location = $7, job_posting_link = $8, salary = $9, notes = $10,
                job_description = $11, updated_at = $12
            WHERE id = $1 AND user_id = $2
            RETURNING {APPLICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner)
        .bind(&row.company_name)
        .bind(&row.job_title)
        .bind(row.application_date)
        .bind(row.status)
        .bind(&row.location)
        .bind(&row.job_posting_link)
        .bind(&row.salary)
        .bind(&row.notes)
        .bind(&row.job_description)
        .bind(row.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(application) => Ok(Some(self.with_resumes(application).await?)),
            None => Ok(None),
        }
    }

    async fn delete_job_application(&self, owner: &str, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM job_applications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_base_resumes(&self, owner: &str) -> Result<Vec<BaseResumeWithGenerated>, AppError> {
        let resumes = sqlx::query_as::<_, BaseResumeRow>(&format!(
            "SELECT {RESUME_COLUMNS} FROM base_resumes WHERE user_id = $1 ORDER BY updated_at DESC"
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        let generated = sqlx::query_as::<_, GeneratedResumeRow>(&format!(
            "SELECT {GENERATED_COLUMNS} FROM generated_resumes \
             WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<GeneratedResumeRow>> = HashMap::new();
        for row in generated {
            grouped.entry(row.base_resume_id).or_default().push(row);
        }

        Ok(resumes
            .into_iter()
            .map(|resume| BaseResumeWithGenerated {
                generated_resumes: grouped.remove(&resume.id).unwrap_or_default(),
                resume,
            })
            .collect())
    }

    async fn latest_base_resume(&self, owner: &str) -> Result<Option<BaseResumeRow>, AppError> {
        let row = sqlx::query_as::<_, BaseResumeRow>(&format!(
            "SELECT {RESUME_COLUMNS} FROM base_resumes WHERE user_id = $1 \
             ORDER BY updated_at DESC LIMIT 1"
        ))
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_base_resume(&self, owner: &str, id: Uuid) -> Result<Option<BaseResumeDetail>, AppError> {
        let Some(resume) = self.fetch_resume(owner, id).await? else {
            return Ok(None);
        };

        let generated = sqlx::query_as::<_, GeneratedResumeRow>(&format!(
            "SELECT {GENERATED_COLUMNS} FROM generated_resumes \
             WHERE base_resume_id = $1 ORDER BY created_at DESC"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let generated_resumes = self
            .with_relations(generated)
            .await?
            .into_iter()
            .map(|g| GeneratedResumeWithApplication {
                generated: g.generated,
                job_application: g.job_application,
            })
            .collect();

        Ok(Some(BaseResumeDetail {
            resume,
            generated_resumes,
        }))
    }

    async fn create_base_resume(&self, owner: &str, new: NewBaseResume) -> Result<BaseResumeRow, AppError> {
        let row = new.into_row(owner, Utc::now());
        let resume = sqlx::query_as::<_, BaseResumeRow>(&format!(
            r#"
            INSERT INTO base_resumes (id, user_id, name, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {RESUME_COLUMNS}
            "#
        ))
        .bind(row.id)
        .bind(&row.user_id)
        .bind(&row.name)
        .bind(&row.content)
        .bind(row.created_at)
        .bind(row.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(resume)
    }

    async fn update_base_resume(
        &self,
        owner: &str,
        id: Uuid,
        changes: BaseResumeChanges,
    ) -> Result<Option<BaseResumeRow>, AppError> {
        let Some(mut row) = self.fetch_resume(owner, id).await? else {
            return Ok(None);
        };
        changes.apply(&mut row, Utc::now());

        let updated = sqlx::query_as::<_, BaseResumeRow>(&format!(
            r#"
            UPDATE base_resumes SET name = $3, content = $4, updated_at = $5
            WHERE id = $1 AND user_id = $2
            RETURNING {RESUME_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner)
        .bind(&row.name)
        .bind(&row.content)
        .bind(row.updated_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete_base_resume(&self, owner: &str, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM base_resumes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_generated_resumes(
        &self,
        owner: &str,
        query: GeneratedQuery,
    ) -> Result<Vec<GeneratedResumeWithRelations>, AppError> {
        let rows = sqlx::query_as::<_, GeneratedResumeRow>(&format!(
            "SELECT {GENERATED_COLUMNS} FROM generated_resumes \
             WHERE user_id = $1 \
               AND ($2::uuid IS NULL OR job_application_id = $2) \
               AND ($3::uuid IS NULL OR base_resume_id = $3) \
             ORDER BY created_at DESC"
        ))
        .bind(owner)
        .bind(query.job_application_id)
        .bind(query.base_resume_id)
        .fetch_all(&self.pool)
        .await?;

        self.with_relations(rows).await
    }

    async fn get_generated_resume(
        &self,
        owner: &str,
        id: Uuid,
    ) -> Result<Option<GeneratedResumeWithRelations>, AppError> {
        let row = sqlx::query_as::<_, GeneratedResumeRow>(&format!(
            "SELECT {GENERATED_COLUMNS} FROM generated_resumes WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.with_relations(vec![row]).await?.into_iter().next()),
            None => Ok(None),
        }
    }

    async fn find_generated_for_pair(
        &self,
        owner: &str,
        job_application_id: Uuid,
        base_resume_id: Uuid,
    ) -> Result<Option<GeneratedResumeRow>, AppError> {
        let row = sqlx::query_as::<_, GeneratedResumeRow>(&format!(
            "SELECT {GENERATED_COLUMNS} FROM generated_resumes \
             WHERE job_application_id = $1 AND base_resume_id = $2 AND user_id = $3"
        ))
        .bind(job_application_id)
        .bind(base_resume_id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_generated_resume(
        &self,
        new: NewGeneratedResume,
    ) -> Result<Option<GeneratedResumeWithRelations>, AppError> {
        let row = new.into_row(Utc::now());

        // Both parents must belong to the same owner; the unique index on the
        // pair turns a concurrent duplicate into a no-op.
        let inserted = sqlx::query_as::<_, GeneratedResumeRow>(&format!(
            r#"
            INSERT INTO generated_resumes
                (id, user_id, job_application_id, base_resume_id, content,
                 job_title, company_name, customizations, created_at, updated_at)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10
            WHERE EXISTS (SELECT 1 FROM job_applications WHERE id = $3 AND user_id = $2)
              AND EXISTS (SELECT 1 FROM base_resumes WHERE id = $4 AND user_id = $2)
            ON CONFLICT (job_application_id, base_resume_id) DO NOTHING
            RETURNING {GENERATED_COLUMNS}
            "#
        ))
        .bind(row.id)
        .bind(&row.user_id)
        .bind(row.job_application_id)
        .bind(row.base_resume_id)
        .bind(&row.content)
        .bind(&row.job_title)
        .bind(&row.company_name)
        .bind(&row.customizations)
        .bind(row.created_at)
        .bind(row.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(row) => Ok(self.with_relations(vec![row]).await?.into_iter().next()),
            None => Ok(None),
        }
    }

    async fn delete_generated_resume(&self, owner: &str, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM generated_resumes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
