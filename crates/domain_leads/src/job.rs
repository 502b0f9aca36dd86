//! Job aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LeadError;
use crate::status::JobStatus;
use core_kernel::{HomeownerId, JobId};

/// Maximum simultaneous claims per job unless the posting specifies one
pub const DEFAULT_CLAIM_CAP: u32 = 2;

/// A service job posted by a homeowner
///
/// The free-text fields are validated for non-emptiness at construction;
/// everything else about the posting workflow lives outside this crate.
/// `claim_cap` is fixed at creation and never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique identifier
    pub id: JobId,
    /// The homeowner who created the job
    pub owner_id: HomeownerId,
    /// Service category
    pub category: String,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Status
    pub status: JobStatus,
    /// Maximum simultaneous claims
    pub claim_cap: u32,
    /// Created timestamp (immutable)
    pub created_at: DateTime<Utc>,
}

/// Data for posting a new job
#[derive(Debug, Clone)]
pub struct NewJob {
    pub owner_id: HomeownerId,
    pub category: String,
    pub title: String,
    pub description: String,
    /// Defaults to [`DEFAULT_CLAIM_CAP`] when absent
    pub claim_cap: Option<u32>,
}

impl Job {
    /// Creates a job in status `Open` from a validated posting
    pub fn post(new: NewJob) -> Result<Self, LeadError> {
        require_non_empty("category", &new.category)?;
        require_non_empty("title", &new.title)?;
        require_non_empty("description", &new.description)?;

        let claim_cap = new.claim_cap.unwrap_or(DEFAULT_CLAIM_CAP);
        if claim_cap == 0 {
            return Err(LeadError::Validation(
                "claim_cap must be a positive integer".to_string(),
            ));
        }

        Ok(Self {
            id: JobId::new_v7(),
            owner_id: new.owner_id,
            category: new.category,
            title: new.title,
            description: new.description,
            status: JobStatus::Open,
            claim_cap,
            created_at: Utc::now(),
        })
    }

    /// Remaining claim slots given the current claim count
    pub fn slots_remaining(&self, claim_count: u32) -> u32 {
        self.claim_cap.saturating_sub(claim_count)
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), LeadError> {
    if value.trim().is_empty() {
        return Err(LeadError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Read-model row for job listings
///
/// Carries the claim count but never the claimant identities; those are
/// only visible to the job's owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: JobId,
    pub category: String,
    pub title: String,
    pub description: String,
    pub status: JobStatus,
    pub claim_count: u32,
    pub claim_cap: u32,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting() -> NewJob {
        NewJob {
            owner_id: HomeownerId::new(),
            category: "plumbing".to_string(),
            title: "Leaking kitchen sink".to_string(),
            description: "Slow drip under the basin, started last week".to_string(),
            claim_cap: None,
        }
    }

    #[test]
    fn test_post_defaults() {
        let job = Job::post(posting()).unwrap();
        assert_eq!(job.status, JobStatus::Open);
        assert_eq!(job.claim_cap, DEFAULT_CLAIM_CAP);
        assert_eq!(job.slots_remaining(0), 2);
        assert_eq!(job.slots_remaining(2), 0);
        assert_eq!(job.slots_remaining(5), 0);
    }

    #[test]
    fn test_post_rejects_blank_fields() {
        let mut new = posting();
        new.title = "   ".to_string();
        assert!(matches!(Job::post(new), Err(LeadError::Validation(_))));

        let mut new = posting();
        new.category = String::new();
        assert!(matches!(Job::post(new), Err(LeadError::Validation(_))));
    }

    #[test]
    fn test_post_rejects_zero_cap() {
        let mut new = posting();
        new.claim_cap = Some(0);
        assert!(matches!(Job::post(new), Err(LeadError::Validation(_))));
    }
}
