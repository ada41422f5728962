//! In-process store with the same ownership and cascade rules as the
//! Postgres schema. Nothing survives a restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
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

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    applications: HashMap<Uuid, JobApplicationRow>,
    resumes: HashMap<Uuid, BaseResumeRow>,
    generated: HashMap<Uuid, GeneratedResumeRow>,
}

impl Tables {
    fn owned_application(&self, owner: &str, id: Uuid) -> Option<&JobApplicationRow> {
        self.applications.get(&id).filter(|a| a.user_id == owner)
    }

    fn owned_resume(&self, owner: &str, id: Uuid) -> Option<&BaseResumeRow> {
        self.resumes.get(&id).filter(|r| r.user_id == owner)
    }

    /// Newest first.
    fn generated_where(&self, pred: impl Fn(&GeneratedResumeRow) -> bool) -> Vec<GeneratedResumeRow> {
        let mut rows: Vec<GeneratedResumeRow> =
            self.generated.values().filter(|&g| pred(g)).cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }

    fn application_with_resumes(&self, application: &JobApplicationRow) -> JobApplicationWithResumes {
        JobApplicationWithResumes {
            application: application.clone(),
            generated_resumes: self.generated_where(|g| g.job_application_id == application.id),
        }
    }

    fn with_relations(&self, generated: GeneratedResumeRow) -> Option<GeneratedResumeWithRelations> {
        let job_application = self.applications.get(&generated.job_application_id)?.clone();
        let base_resume = self.resumes.get(&generated.base_resume_id)?.clone();
        Some(GeneratedResumeWithRelations {
            generated,
            job_application,
            base_resume,
        })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ensure_user(&self, owner: &str) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .entry(owner.to_string())
            .or_insert_with(|| User::placeholder(owner, Utc::now()));
        Ok(user.clone())
    }

    async fn list_job_applications(
        &self,
        owner: &str,
        query: ApplicationQuery,
    ) -> Result<(Vec<JobApplicationWithResumes>, u64), AppError> {
        let tables = self.tables.read().await;
        let mut matching: Vec<&JobApplicationRow> = tables
            .applications
            .values()
            .filter(|a| a.user_id == owner)
            .filter(|a| query.status.map_or(true, |s| a.status == s))
            .collect();
        matching.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .map(|a| tables.application_with_resumes(a))
            .collect();
        Ok((page, total))
    }

    async fn get_job_application(
        &self,
        owner: &str,
        id: Uuid,
    ) -> Result<Option<JobApplicationWithResumes>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .owned_application(owner, id)
            .map(|a| tables.application_with_resumes(a)))
    }

    async fn create_job_application(
        &self,
        owner: &str,
        new: NewJobApplication,
    ) -> Result<JobApplicationWithResumes, AppError> {
        let row = new.into_row(owner, Utc::now());
        let mut tables = self.tables.write().await;
        tables.applications.insert(row.id, row.clone());
        Ok(JobApplicationWithResumes {
            application: row,
            generated_resumes: Vec::new(),
        })
    }

    async fn update_job_application(
        &self,
        owner: &str,
        id: Uuid,
        changes: JobApplicationChanges,
    ) -> Result<Option<JobApplicationWithResumes>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables.applications.get_mut(&id).filter(|a| a.user_id == owner) else {
            return Ok(None);
        };
        changes.apply(row, Utc::now());
        let row = row.clone();
        Ok(Some(tables.application_with_resumes(&row)))
    }

    async fn delete_job_application(&self, owner: &str, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if tables.owned_application(owner, id).is_none() {
            return Ok(false);
        }
        tables.applications.remove(&id);
        tables.generated.retain(|_, g| g.job_application_id != id);
        Ok(true)
    }

    async fn list_base_resumes(&self, owner: &str) -> Result<Vec<BaseResumeWithGenerated>, AppError> {
        let tables = self.tables.read().await;
        let mut resumes: Vec<&BaseResumeRow> =
            tables.resumes.values().filter(|r| r.user_id == owner).collect();
        resumes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(resumes
            .into_iter()
            .map(|resume| BaseResumeWithGenerated {
                resume: resume.clone(),
                generated_resumes: tables.generated_where(|g| g.base_resume_id == resume.id),
            })
            .collect())
    }

    async fn latest_base_resume(&self, owner: &str) -> Result<Option<BaseResumeRow>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .resumes
            .values()
            .filter(|r| r.user_id == owner)
            .max_by_key(|r| r.updated_at)
            .cloned())
    }

    async fn get_base_resume(&self, owner: &str, id: Uuid) -> Result<Option<BaseResumeDetail>, AppError> {
        let tables = self.tables.read().await;
        let Some(resume) = tables.owned_resume(owner, id) else {
            return Ok(None);
        };

        let generated_resumes = tables
            .generated_where(|g| g.base_resume_id == id)
            .into_iter()
            .filter_map(|generated| {
                let job_application = tables.applications.get(&generated.job_application_id)?.clone();
                Some(GeneratedResumeWithApplication {
                    generated,
                    job_application,
                })
            })
            .collect();

        Ok(Some(BaseResumeDetail {
            resume: resume.clone(),
            generated_resumes,
        }))
    }

    async fn create_base_resume(&self, owner: &str, new: NewBaseResume) -> Result<BaseResumeRow, AppError> {
        let row = new.into_row(owner, Utc::now());
        self.tables.write().await.resumes.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_base_resume(
        &self,
        owner: &str,
        id: Uuid,
        changes: BaseResumeChanges,
    ) -> Result<Option<BaseResumeRow>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables.resumes.get_mut(&id).filter(|r| r.user_id == owner) else {
            return Ok(None);
        };
        changes.apply(row, Utc::now());
        Ok(Some(row.clone()))
    }

    async fn delete_base_resume(&self, owner: &str, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if tables.owned_resume(owner, id).is_none() {
            return Ok(false);
        }
        tables.resumes.remove(&id);
        tables.generated.retain(|_, g| g.base_resume_id != id);
        Ok(true)
    }

    async fn list_generated_resumes(
        &self,
        owner: &str,
        query: GeneratedQuery,
    ) -> Result<Vec<GeneratedResumeWithRelations>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .generated_where(|g| {
                g.user_id == owner
                    && query.job_application_id.map_or(true, |id| g.job_application_id == id)
                    && query.base_resume_id.map_or(true, |id| g.base_resume_id == id)
            })
            .into_iter()
            .filter_map(|g| tables.with_relations(g))
            .collect())
    }

    async fn get_generated_resume(
        &self,
        owner: &str,
        id: Uuid,
    ) -> Result<Option<GeneratedResumeWithRelations>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .generated
            .get(&id)
            .filter(|g| g.user_id == owner)
            .cloned()
            .and_then(|g| tables.with_relations(g)))
    }

    async fn find_generated_for_pair(
        &self,
        owner: &str,
        job_application_id: Uuid,
        base_resume_id: Uuid,
    ) -> Result<Option<GeneratedResumeRow>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .generated
            .values()
            .find(|g| {
                g.user_id == owner
                    && g.job_application_id == job_application_id
                    && g.base_resume_id == base_resume_id
            })
            .cloned())
    }

    async fn insert_generated_resume(
        &self,
        new: NewGeneratedResume,
    ) -> Result<Option<GeneratedResumeWithRelations>, AppError> {
        let mut tables = self.tables.write().await;

        let parents_owned = tables
            .owned_application(&new.user_id, new.job_application_id)
            .is_some()
            && tables.owned_resume(&new.user_id, new.base_resume_id).is_some();
        let pair_taken = tables.generated.values().any(|g| {
            g.job_application_id == new.job_application_id && g.base_resume_id == new.base_resume_id
        });
        if !parents_owned || pair_taken {
            return Ok(None);
        }

        let row = new.into_row(Utc::now());
        tables.generated.insert(row.id, row.clone());
        Ok(tables.with_relations(row))
    }

    async fn delete_generated_resume(&self, owner: &str, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let owned = tables.generated.get(&id).is_some_and(|g| g.user_id == owner);
        if owned {
            tables.generated.remove(&id);
        }
        Ok(owned)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;

    use super::*;
    use crate::models::job_application::ApplicationStatus;

    fn application(company: &str) -> NewJobApplication {
        NewJobApplication {
            company_name: company.into(),
            job_title: "Engineer".into(),
            application_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            status: ApplicationStatus::Opening,
            location: None,
            job_posting_link: None,
            salary: None,
            notes: None,
            job_description: None,
        }
    }

    fn resume() -> NewBaseResume {
        NewBaseResume {
            name: "Main".into(),
            content: "Jane Doe\njane@example.com\n".into(),
        }
    }

    fn generated(owner: &str, job: Uuid, base: Uuid) -> NewGeneratedResume {
        NewGeneratedResume {
            user_id: owner.into(),
            job_application_id: job,
            base_resume_id: base,
            content: "tailored".into(),
            job_title: "Engineer".into(),
            company_name: "Acme".into(),
            customizations: None,
        }
    }

    fn first_page() -> ApplicationQuery {
        ApplicationQuery {
            status: None,
            page: 1,
            limit: 50,
        }
    }

    #[tokio::test]
    async fn test_records_are_invisible_to_other_owners() {
        let store = MemoryStore::new();
        let created = store.create_job_application("alice", application("Acme")).await.unwrap();
        let id = created.application.id;

        assert!(store.get_job_application("bob", id).await.unwrap().is_none());
        assert!(store
            .update_job_application("bob", id, JobApplicationChanges::default())
            .await
            .unwrap()
            .is_none());
        assert!(!store.delete_job_application("bob", id).await.unwrap());
        assert!(store.get_job_application("alice", id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_twice_reports_absent() {
        let store = MemoryStore::new();
        let id = store.create_base_resume("alice", resume()).await.unwrap().id;
        assert!(store.delete_base_resume("alice", id).await.unwrap());
        assert!(!store.delete_base_resume("alice", id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_filters_and_pages() {
        let store = MemoryStore::new();
        for company in ["A", "B", "C"] {
            store.create_job_application("alice", application(company)).await.unwrap();
        }
        let offer = store.create_job_application("alice", application("D")).await.unwrap();
        store
            .update_job_application(
                "alice",
                offer.application.id,
                JobApplicationChanges {
                    status: Some(ApplicationStatus::Offer),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let (page, total) = store
            .list_job_applications(
                "alice",
                ApplicationQuery {
                    status: None,
                    page: 2,
                    limit: 3,
                },
            )
            .await
            .unwrap();
        assert_eq!(total, 4);
        assert_eq!(page.len(), 1);

        let (offers, total) = store
            .list_job_applications(
                "alice",
                ApplicationQuery {
                    status: Some(ApplicationStatus::Offer),
                    ..first_page()
                },
            )
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(offers[0].application.company_name, "D");
    }

    #[tokio::test]
    async fn test_list_orders_by_most_recent_update() {
        let store = MemoryStore::new();
        let first = store.create_job_application("alice", application("First")).await.unwrap();
        store.create_job_application("alice", application("Second")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        store
            .update_job_application("alice", first.application.id, JobApplicationChanges::default())
            .await
            .unwrap();

        let (items, _) = store.list_job_applications("alice", first_page()).await.unwrap();
        assert_eq!(items[0].application.company_name, "First");
    }

    #[tokio::test]
    async fn test_generated_pair_is_unique() {
        let store = MemoryStore::new();
        let job = store.create_job_application("alice", application("Acme")).await.unwrap();
        let base = store.create_base_resume("alice", resume()).await.unwrap();

        let first = store
            .insert_generated_resume(generated("alice", job.application.id, base.id))
            .await
            .unwrap();
        assert!(first.is_some());

        let second = store
            .insert_generated_resume(generated("alice", job.application.id, base.id))
            .await
            .unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_generated_requires_owned_parents() {
        let store = MemoryStore::new();
        let job = store.create_job_application("alice", application("Acme")).await.unwrap();
        let base = store.create_base_resume("alice", resume()).await.unwrap();

        let inserted = store
            .insert_generated_resume(generated("bob", job.application.id, base.id))
            .await
            .unwrap();
        assert!(inserted.is_none());
    }

    #[tokio::test]
    async fn test_deleting_application_cascades_to_generated() {
        let store = MemoryStore::new();
        let job = store.create_job_application("alice", application("Acme")).await.unwrap();
        let base = store.create_base_resume("alice", resume()).await.unwrap();
        let gen = store
            .insert_generated_resume(generated("alice", job.application.id, base.id))
            .await
            .unwrap()
            .unwrap();

        assert!(store.delete_job_application("alice", job.application.id).await.unwrap());
        assert!(store
            .get_generated_resume("alice", gen.generated.id)
            .await
            .unwrap()
            .is_none());
        let detail = store.get_base_resume("alice", base.id).await.unwrap().unwrap();
        assert!(detail.generated_resumes.is_empty());
    }

    #[tokio::test]
    async fn test_latest_base_resume_tracks_updates() {
        let store = MemoryStore::new();
        let older = store.create_base_resume("alice", resume()).await.unwrap();
        store.create_base_resume("alice", resume()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        store
            .update_base_resume(
                "alice",
                older.id,
                BaseResumeChanges {
                    name: Some("Updated".into()),
                    content: None,
                },
            )
            .await
            .unwrap();

        let latest = store.latest_base_resume("alice").await.unwrap().unwrap();
        assert_eq!(latest.id, older.id);
        assert!(store.latest_base_resume("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ensure_user_is_idempotent() {
        let store = MemoryStore::new();
        let first = store.ensure_user("42").await.unwrap();
        let again = store.ensure_user("42").await.unwrap();
        assert_eq!(first.email, "user-42@example.com");
        assert_eq!(first.created_at, again.created_at);
    }
}
