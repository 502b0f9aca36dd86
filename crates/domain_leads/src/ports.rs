//! Lead domain ports
//!
//! The two seams of the claim path. `LeadStore` is the durable job/claim
//! store; its `finalize_claim` is the single indivisible
//! cap-check-and-insert the whole design hangs on. `PaymentGateway` is the
//! outward adapter to the external checkout provider.
//!
//! Multiple adapters implement each trait:
//!
//! - `infra_store::InMemoryLeadStore` / `infra_store::PostgresLeadStore`
//! - `infra_payments::CheckoutGateway` / `infra_payments::MockPaymentGateway`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::claim::Claim;
use crate::job::{Job, JobSummary};
use crate::status::{JobEvent, JobStatus};
use core_kernel::{DomainPort, JobId, Money, PaymentRef, PortError, ProId};

/// Result of the store's atomic finalize step
///
/// `Inserted` and `AlreadyRecorded` are the two success shapes; the rest
/// are rejections decided inside the store's critical section.
#[derive(Debug, Clone)]
pub enum FinalizeInsert {
    /// The claim was inserted; `new_count` includes it
    Inserted {
        claim: Claim,
        new_count: u32,
        cap: u32,
    },
    /// This payment session was already consumed by a prior finalize
    AlreadyRecorded {
        claim: Claim,
        count: u32,
        cap: u32,
    },
    /// The professional already holds a claim on this job under a
    /// different payment session
    DuplicateClaim { existing: Claim },
    /// The cap was reached before this finalize won the race
    CapExceeded { cap: u32 },
}

/// Result of atomically applying a workflow event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The state machine accepted the event; the new status is persisted
    Advanced(JobStatus),
    /// The event does not apply to the current status; nothing changed
    Rejected { from: JobStatus },
}

/// Durable record of jobs and claims
///
/// Correctness must hold across independent processes sharing only this
/// store, so every conditional write is exposed as one atomic call rather
/// than a read followed by a write. Finalize calls for the same job are
/// mutually exclusive; different jobs must not block each other.
#[async_trait]
pub trait LeadStore: DomainPort {
    /// Persists a freshly posted job
    async fn create_job(&self, job: &Job) -> Result<(), PortError>;

    /// Retrieves a job by id
    async fn get_job(&self, job_id: JobId) -> Result<Job, PortError>;

    /// Lists jobs newest-first with their claim counts
    async fn list_jobs(&self) -> Result<Vec<JobSummary>, PortError>;

    /// Current number of claims on a job
    async fn claim_count(&self, job_id: JobId) -> Result<u32, PortError>;

    /// Finds the claim a professional holds on a job, if any
    async fn find_claim(&self, job_id: JobId, pro_id: ProId)
        -> Result<Option<Claim>, PortError>;

    /// All claims on a job (owner-only surface)
    async fn claims_for_job(&self, job_id: JobId) -> Result<Vec<Claim>, PortError>;

    /// The atomic finalize-or-reject step
    ///
    /// As a single unit, serialized against all other finalize attempts on
    /// the same job: re-check whether `payment_ref` was already consumed,
    /// re-check the `(job, pro)` pair, re-count, and insert only if the
    /// count is below the cap. Two finalizes racing for the last slot must
    /// resolve to exactly one `Inserted`.
    async fn finalize_claim(
        &self,
        job_id: JobId,
        pro_id: ProId,
        payment_ref: &PaymentRef,
    ) -> Result<FinalizeInsert, PortError>;

    /// Atomically reads the current status, runs the state machine, and
    /// persists the result
    ///
    /// Running [`crate::status::advance`] inside the store's critical
    /// section keeps status monotonic when claim events land out of order.
    async fn apply_event(&self, job_id: JobId, event: JobEvent)
        -> Result<EventOutcome, PortError>;

    /// Test-and-set marking a session as refunded
    ///
    /// Returns `true` exactly once per session so a compensating refund is
    /// never issued twice, even under concurrent replayed confirmations.
    async fn try_mark_refunded(&self, payment_ref: &PaymentRef) -> Result<bool, PortError>;

    /// Clears the refund mark after a failed gateway refund so a retried
    /// confirmation can trigger it again
    async fn clear_refund_mark(&self, payment_ref: &PaymentRef) -> Result<(), PortError>;
}

/// An open checkout session at the external payment provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider-issued session identifier
    pub session_id: PaymentRef,
    /// Where to send the professional to pay
    pub redirect_url: String,
}

/// Reported state of a payment session
///
/// Only `Completed` ever consumes a claim slot. A session left `Pending`
/// indefinitely has no effect on job state and needs no compensation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    Completed,
    Cancelled,
    Pending,
    Unknown,
}

/// Adapter contract to the external payment provider
///
/// The adapter never retries on its own; retry policy belongs to the
/// caller. `outcome` is safe to poll repeatedly.
#[async_trait]
pub trait PaymentGateway: DomainPort {
    /// Opens a checkout session priced at `amount`, tagged with the
    /// `(job, pro)` pair
    async fn create_session(
        &self,
        job_id: JobId,
        pro_id: ProId,
        amount: Money,
    ) -> Result<CheckoutSession, PortError>;

    /// Reports the session's current outcome
    async fn outcome(&self, session_id: &PaymentRef) -> Result<SessionOutcome, PortError>;

    /// Compensating action: returns the fee for a paid session whose slot
    /// was no longer available
    async fn refund(&self, session_id: &PaymentRef) -> Result<(), PortError>;
}
