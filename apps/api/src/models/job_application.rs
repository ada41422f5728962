use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

use crate::models::resume::GeneratedResumeRow;

/// Kanban column an application sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    #[default]
    Opening,
    Applied,
    InterviewScheduled,
    Interviewing,
    Offer,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Opening,
        ApplicationStatus::Applied,
        ApplicationStatus::InterviewScheduled,
        ApplicationStatus::Interviewing,
        ApplicationStatus::Offer,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Opening => "OPENING",
            ApplicationStatus::Applied => "APPLIED",
            ApplicationStatus::InterviewScheduled => "INTERVIEW_SCHEDULED",
            ApplicationStatus::Interviewing => "INTERVIEWING",
            ApplicationStatus::Offer => "OFFER",
            ApplicationStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown application status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for ApplicationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobApplicationRow {
    pub id: Uuid,
    pub user_id: String,
    pub company_name: String,
    pub job_title: String,
    pub application_date: DateTime<Utc>,
    pub status: ApplicationStatus,
    pub location: Option<String>,
    pub job_posting_link: Option<String>,
    pub salary: Option<String>,
    pub notes: Option<String>,
    pub job_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An application with its generated resumes, newest first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobApplicationWithResumes {
    #[serde(flatten)]
    pub application: JobApplicationRow,
    pub generated_resumes: Vec<GeneratedResumeRow>,
}

/// Request body shared by create, PUT and PATCH.
///
/// Every field is optional at the wire level; which ones are required is
/// decided by `validation::validate_job_application`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobApplicationPayload {
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    pub application_date: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
    pub job_posting_link: Option<String>,
    pub salary: Option<String>,
    pub notes: Option<String>,
    pub job_description: Option<String>,
}

/// A validated application ready to insert.
#[derive(Debug, Clone)]
pub struct NewJobApplication {
    pub company_name: String,
    pub job_title: String,
    pub application_date: DateTime<Utc>,
    pub status: ApplicationStatus,
    pub location: Option<String>,
    pub job_posting_link: Option<String>,
    pub salary: Option<String>,
    pub notes: Option<String>,
    pub job_description: Option<String>,
}

impl NewJobApplication {
    pub fn into_row(self, user_id: &str, now: DateTime<Utc>) -> JobApplicationRow {
        JobApplicationRow {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            company_name: self.company_name,
            job_title: self.job_title,
            application_date: self.application_date,
            status: self.status,
            location: self.location,
            job_posting_link: self.job_posting_link,
            salary: self.salary,
            notes: self.notes,
            job_description: self.job_description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A validated partial update. `None` leaves a field unchanged; for optional
/// columns `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct JobApplicationChanges {
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    pub application_date: Option<DateTime<Utc>>,
    pub status: Option<ApplicationStatus>,
    pub location: Option<Option<String>>,
    pub job_posting_link: Option<Option<String>>,
    pub salary: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub job_description: Option<Option<String>>,
}

impl JobApplicationChanges {
    pub fn apply(self, row: &mut JobApplicationRow, now: DateTime<Utc>) {
        if let Some(v) = self.company_name {
            row.company_name = v;
        }
        if let Some(v) = self.job_title {
            row.job_title = v;
        }
        if let Some(v) = self.application_date {
            row.application_date = v;
        }
        if let Some(v) = self.status {
            row.status = v;
        }
        if let Some(v) = self.location {
            row.location = v;
        }
        if let Some(v) = self.job_posting_link {
            row.job_posting_link = v;
        }
        if let Some(v) = self.salary {
            row.salary = v;
        }
        if let Some(v) = self.notes {
            row.notes = v;
        }
        if let Some(v) = self.job_description {
            row.job_description = v;
        }
        row.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> JobApplicationRow {
        NewJobApplication {
            company_name: "Acme".into(),
            job_title: "Engineer".into(),
            application_date: Utc::now(),
            status: ApplicationStatus::Applied,
            location: Some("Remote".into()),
            job_posting_link: None,
            salary: None,
            notes: Some("referral".into()),
            job_description: None,
        }
        .into_row("owner-1", Utc::now())
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in ApplicationStatus::ALL {
            assert_eq!(status.as_str().parse::<ApplicationStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_parse_is_exact() {
        assert!("applied".parse::<ApplicationStatus>().is_err());
        assert!("HIRED".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_screaming_snake() {
        let json = serde_json::to_string(&ApplicationStatus::InterviewScheduled).unwrap();
        assert_eq!(json, "\"INTERVIEW_SCHEDULED\"");
    }

    #[test]
    fn test_changes_only_touch_supplied_fields() {
        let mut row = sample_row();
        let changes = JobApplicationChanges {
            status: Some(ApplicationStatus::Offer),
            notes: Some(None),
            ..Default::default()
        };
        changes.apply(&mut row, Utc::now());

        assert_eq!(row.status, ApplicationStatus::Offer);
        assert_eq!(row.notes, None);
        assert_eq!(row.location.as_deref(), Some("Remote"));
        assert_eq!(row.company_name, "Acme");
    }

    #[test]
    fn test_row_serializes_camel_case_with_relations() {
        let with = JobApplicationWithResumes {
            application: sample_row(),
            generated_resumes: vec![],
        };
        let value = serde_json::to_value(&with).unwrap();
        assert_eq!(value["companyName"], "Acme");
        assert_eq!(value["userId"], "owner-1");
        assert!(value["generatedResumes"].as_array().unwrap().is_empty());
    }
}
