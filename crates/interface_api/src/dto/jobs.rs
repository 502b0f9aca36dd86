//! Job DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_leads::{Job, JobStatus, JobSummary};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    #[validate(length(min = 1, message = "category must not be empty"))]
    pub category: String,
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: String,
    pub claim_cap: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct JobEventRequest {
    pub event: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub status: JobStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub id: Uuid,
    pub category: String,
    pub title: String,
    pub description: String,
    pub status: JobStatus,
    pub claim_count: u32,
    pub claim_cap: u32,
    pub created_at: DateTime<Utc>,
    /// Claimant identities, present only when the caller owns the job
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_by: Option<Vec<Uuid>>,
}

impl JobResponse {
    pub fn from_parts(job: Job, claim_count: u32, claimed_by: Option<Vec<Uuid>>) -> Self {
        Self {
            id: *job.id.as_uuid(),
            category: job.category,
            title: job.title,
            description: job.description,
            status: job.status,
            claim_count,
            claim_cap: job.claim_cap,
            created_at: job.created_at,
            claimed_by,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummaryResponse {
    pub id: Uuid,
    pub category: String,
    pub title: String,
    pub description: String,
    pub status: JobStatus,
    pub claim_count: u32,
    pub claim_cap: u32,
    pub created_at: DateTime<Utc>,
}

impl From<JobSummary> for JobSummaryResponse {
    fn from(summary: JobSummary) -> Self {
        Self {
            id: *summary.id.as_uuid(),
            category: summary.category,
            title: summary.title,
            description: summary.description,
            status: summary.status,
            claim_count: summary.claim_count,
            claim_cap: summary.claim_cap,
            created_at: summary.created_at,
        }
    }
}
