//! Lead claim error taxonomy

use thiserror::Error;

use crate::ports::SessionOutcome;
use crate::status::{JobEvent, JobStatus};
use core_kernel::PortError;

/// Errors surfaced by the lead claim coordinator
///
/// Validation-level errors (`JobNotFound`, `JobNotOpen`, `DuplicateClaim`,
/// `Validation`) are final: retrying without changing the request cannot
/// succeed. Gateway and store errors are retry-safe because both
/// coordinator operations are idempotent with respect to already-completed
/// side effects. A replayed finalize for an already-recorded session is not
/// an error at all; it returns the original success result.
#[derive(Debug, Error)]
pub enum LeadError {
    #[error("Job not found")]
    JobNotFound,

    #[error("Job is not accepting claims (status: {0})")]
    JobNotOpen(JobStatus),

    #[error("Job already has the maximum number of claims")]
    JobFull,

    #[error("Professional already holds a claim on this job")]
    DuplicateClaim,

    #[error("Payment session could not be created")]
    PaymentSessionFailed(#[source] PortError),

    #[error("Payment session is not completed (outcome: {outcome:?})")]
    PaymentNotConfirmed { outcome: SessionOutcome },

    #[error("Claim slot no longer available (refund issued: {refund_issued})")]
    CapExceeded { refund_issued: bool },

    #[error("Cannot apply {event:?} to job in status {from}")]
    InvalidTransition { from: JobStatus, event: JobEvent },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payment gateway error")]
    Gateway(#[source] PortError),

    #[error("Store error")]
    Store(#[source] PortError),
}

impl From<PortError> for LeadError {
    /// Store errors reach the coordinator through this conversion; a
    /// missing job is the only NotFound the store reports
    fn from(err: PortError) -> Self {
        if err.is_not_found() {
            LeadError::JobNotFound
        } else {
            LeadError::Store(err)
        }
    }
}

impl LeadError {
    /// Whether the caller may safely re-invoke the failed operation
    pub fn is_retry_safe(&self) -> bool {
        match self {
            LeadError::PaymentSessionFailed(e)
            | LeadError::Gateway(e)
            | LeadError::Store(e) => e.is_transient(),
            _ => false,
        }
    }
}
