//! Job status state machine
//!
//! A pure function from current status and event to next status. It has no
//! side effects of its own; the store invokes it inside its critical section
//! so that persisted status can never move backward.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Posted, no claims yet
    Open,
    /// At least one claim, slots remaining
    PartiallyClaimed,
    /// All claim slots consumed
    Full,
    /// Homeowner is negotiating with a claiming professional
    Negotiating,
    /// A professional was hired
    Hired,
    /// Work completed and closed
    Closed,
    /// Cancelled by the homeowner
    Cancelled,
}

impl JobStatus {
    /// Terminal statuses admit no further events
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Closed | JobStatus::Cancelled)
    }

    /// Whether new claim requests may be opened against the job
    pub fn accepts_claims(&self) -> bool {
        matches!(self, JobStatus::Open | JobStatus::PartiallyClaimed)
    }

    /// Stable string form used for persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Open => "open",
            JobStatus::PartiallyClaimed => "partially_claimed",
            JobStatus::Full => "full",
            JobStatus::Negotiating => "negotiating",
            JobStatus::Hired => "hired",
            JobStatus::Closed => "closed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Parses the persisted string form
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(JobStatus::Open),
            "partially_claimed" => Some(JobStatus::PartiallyClaimed),
            "full" => Some(JobStatus::Full),
            "negotiating" => Some(JobStatus::Negotiating),
            "hired" => Some(JobStatus::Hired),
            "closed" => Some(JobStatus::Closed),
            "cancelled" => Some(JobStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Events that drive a job through its workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JobEvent {
    /// A claim was finalized; `count` is the claim count after the insert
    ClaimAdded { count: u32, cap: u32 },
    /// The homeowner opened negotiations with a claimant
    NegotiateStarted,
    /// The homeowner hired a professional
    Hired,
    /// The hired work is done
    Close,
    /// Homeowner-initiated cancellation
    Cancel,
}

/// The event does not apply to the current status
///
/// Reported instead of mutating anything; callers decide whether it is
/// fatal. A replayed `ClaimAdded` against a job that already advanced is
/// the benign case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot apply {event:?} to job in status {from}")]
pub struct InvalidTransition {
    pub from: JobStatus,
    pub event: JobEvent,
}

/// Maps current status + event to the next status
///
/// `ClaimAdded { count, cap }` moves the job to `Full` exactly when the
/// count reaches the cap; a count above the cap is never produced by the
/// store and is rejected here as a defense.
pub fn advance(status: JobStatus, event: JobEvent) -> Result<JobStatus, InvalidTransition> {
    use JobEvent::*;
    use JobStatus::*;

    let next = match (status, event) {
        (Open, ClaimAdded { count, cap }) | (PartiallyClaimed, ClaimAdded { count, cap }) => {
            if count == cap {
                Some(Full)
            } else if count < cap {
                Some(PartiallyClaimed)
            } else {
                None
            }
        }
        (PartiallyClaimed, NegotiateStarted) | (Full, NegotiateStarted) => Some(Negotiating),
        (Negotiating, JobEvent::Hired) => Some(JobStatus::Hired),
        (JobStatus::Hired, Close) => Some(Closed),
        (from, Cancel) if !from.is_terminal() => Some(Cancelled),
        _ => None,
    };

    next.ok_or(InvalidTransition {
        from: status,
        event,
    })
}
