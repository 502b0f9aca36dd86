//! Lead claim coordinator
//!
//! Orchestrates the store, the payment gateway, and the status state
//! machine. `request_claim` is read-only plus one outward call and runs
//! fully concurrent; `finalize_claim` is the sole serialization point, and
//! only per job, via the store's atomic finalize.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::claim::Claim;
use crate::error::LeadError;
use crate::job::{Job, NewJob};
use crate::ports::{
    CheckoutSession, EventOutcome, FinalizeInsert, LeadStore, PaymentGateway, SessionOutcome,
};
use crate::status::{JobEvent, JobStatus};
use core_kernel::{Currency, JobId, Money, PaymentRef, ProId};

/// Fixed per-lead fee in minor units (USD cents)
pub const LEAD_FEE_MINOR_UNITS: i64 = 1000;

/// The fixed fee a professional pays to claim a lead
pub fn lead_fee() -> Money {
    Money::from_minor(LEAD_FEE_MINOR_UNITS, Currency::USD)
}

/// Successful outcome of a finalize
///
/// Replays of the same payment session return the identical result with
/// `already_finalized` set; callers treat both shapes as success.
#[derive(Debug, Clone)]
pub struct FinalizedClaim {
    pub claim: Claim,
    pub claim_count: u32,
    pub job_status: JobStatus,
    pub already_finalized: bool,
}

/// Coordinates claim requests, payment confirmation, and the job workflow
///
/// The coordinator is the single source of truth for job status: every
/// status a client observes comes back from a store read or one of these
/// calls, never from client-held state.
pub struct LeadClaimCoordinator {
    store: Arc<dyn LeadStore>,
    gateway: Arc<dyn PaymentGateway>,
    fee: Money,
}

impl LeadClaimCoordinator {
    /// Creates a coordinator charging the standard lead fee
    pub fn new(store: Arc<dyn LeadStore>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self::with_fee(store, gateway, lead_fee())
    }

    /// Creates a coordinator with an explicit fee (configuration override)
    pub fn with_fee(
        store: Arc<dyn LeadStore>,
        gateway: Arc<dyn PaymentGateway>,
        fee: Money,
    ) -> Self {
        Self {
            store,
            gateway,
            fee,
        }
    }

    /// The store this coordinator reads and writes
    pub fn store(&self) -> &Arc<dyn LeadStore> {
        &self.store
    }

    /// Validates and persists a new job posting in status `Open`
    pub async fn post_job(&self, new: NewJob) -> Result<Job, LeadError> {
        let job = Job::post(new)?;
        self.store.create_job(&job).await?;
        info!(job_id = %job.id, cap = job.claim_cap, "job posted");
        Ok(job)
    }

    /// Opens a payment session for a professional to claim a job
    ///
    /// The cap check here is optimistic; the authoritative check happens at
    /// finalize. Nothing is persisted, so a failed call is always safe to
    /// retry.
    #[instrument(skip(self), fields(job_id = %job_id, pro_id = %pro_id))]
    pub async fn request_claim(
        &self,
        job_id: JobId,
        pro_id: ProId,
    ) -> Result<CheckoutSession, LeadError> {
        let job = self.store.get_job(job_id).await?;
        if !job.status.accepts_claims() {
            return Err(match job.status {
                JobStatus::Full => LeadError::JobFull,
                status => LeadError::JobNotOpen(status),
            });
        }

        let count = self.store.claim_count(job_id).await?;
        if count >= job.claim_cap {
            return Err(LeadError::JobFull);
        }

        if self.store.find_claim(job_id, pro_id).await?.is_some() {
            return Err(LeadError::DuplicateClaim);
        }

        let session = self
            .gateway
            .create_session(job_id, pro_id, self.fee)
            .await
            .map_err(LeadError::PaymentSessionFailed)?;

        info!(session_id = %session.session_id, "checkout session opened");
        Ok(session)
    }

    /// Converts a confirmed payment into a persisted claim
    ///
    /// Safe to call any number of times with the same `payment_ref`:
    /// replays return the original success result, never a second row and
    /// never a second charge. This is the only place the cap invariant is
    /// authoritatively enforced.
    #[instrument(skip(self), fields(job_id = %job_id, pro_id = %pro_id, session = %payment_ref))]
    pub async fn finalize_claim(
        &self,
        job_id: JobId,
        pro_id: ProId,
        payment_ref: PaymentRef,
    ) -> Result<FinalizedClaim, LeadError> {
        // Replay fast path: a recorded claim means the payment was already
        // verified and consumed, so the gateway need not be reachable.
        if let Some(existing) = self.store.find_claim(job_id, pro_id).await? {
            if existing.payment_ref == payment_ref {
                return self.replayed_result(existing).await;
            }
            // Same professional completed a second, different session for
            // this job. The original claim stands; the extra payment is
            // returned.
            if self.session_completed(&payment_ref).await? {
                self.issue_refund_once(&payment_ref).await?;
            }
            return Err(LeadError::DuplicateClaim);
        }

        let outcome = self
            .gateway
            .outcome(&payment_ref)
            .await
            .map_err(LeadError::Gateway)?;
        if outcome != SessionOutcome::Completed {
            return Err(LeadError::PaymentNotConfirmed { outcome });
        }

        match self
            .store
            .finalize_claim(job_id, pro_id, &payment_ref)
            .await?
        {
            FinalizeInsert::Inserted {
                claim,
                new_count,
                cap,
            } => {
                let event = JobEvent::ClaimAdded {
                    count: new_count,
                    cap,
                };
                let job_status = match self.store.apply_event(job_id, event).await? {
                    EventOutcome::Advanced(status) => status,
                    // Another finalize already advanced the job past this
                    // event; the claim itself stands.
                    EventOutcome::Rejected { from } => from,
                };
                info!(claim_id = %claim.id, count = new_count, status = %job_status, "claim finalized");
                Ok(FinalizedClaim {
                    claim,
                    claim_count: new_count,
                    job_status,
                    already_finalized: false,
                })
            }
            FinalizeInsert::AlreadyRecorded { claim, .. } => self.replayed_result(claim).await,
            FinalizeInsert::DuplicateClaim { .. } => {
                // Lost a race against our own other confirmation; the
                // payment for this session must still be returned.
                self.issue_refund_once(&payment_ref).await?;
                Err(LeadError::DuplicateClaim)
            }
            FinalizeInsert::CapExceeded { cap } => {
                warn!(cap, "claim finalize lost the race for the last slot");
                self.issue_refund_once(&payment_ref).await?;
                Err(LeadError::CapExceeded {
                    refund_issued: true,
                })
            }
        }
    }

    /// Drives the workflow outside the claim path (negotiate, hire, close,
    /// cancel)
    ///
    /// Here `InvalidTransition` is surfaced to the caller rather than
    /// swallowed; an explicit action against the wrong status is a real
    /// error.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn advance_job(
        &self,
        job_id: JobId,
        event: JobEvent,
    ) -> Result<JobStatus, LeadError> {
        match self.store.apply_event(job_id, event).await? {
            EventOutcome::Advanced(status) => {
                info!(status = %status, "job advanced");
                Ok(status)
            }
            EventOutcome::Rejected { from } => Err(LeadError::InvalidTransition { from, event }),
        }
    }

    async fn replayed_result(&self, claim: Claim) -> Result<FinalizedClaim, LeadError> {
        let job = self.store.get_job(claim.job_id).await?;
        let count = self.store.claim_count(claim.job_id).await?;
        info!(claim_id = %claim.id, "replayed confirmation for finalized claim");
        Ok(FinalizedClaim {
            claim,
            claim_count: count,
            job_status: job.status,
            already_finalized: true,
        })
    }

    async fn session_completed(&self, payment_ref: &PaymentRef) -> Result<bool, LeadError> {
        let outcome = self
            .gateway
            .outcome(payment_ref)
            .await
            .map_err(LeadError::Gateway)?;
        Ok(outcome == SessionOutcome::Completed)
    }

    /// Issues the compensating refund exactly once per session
    ///
    /// The store's test-and-set decides the winner under concurrent
    /// replays; a failed gateway call releases the mark so a retried
    /// confirmation can trigger the refund again.
    async fn issue_refund_once(&self, payment_ref: &PaymentRef) -> Result<bool, LeadError> {
        if !self.store.try_mark_refunded(payment_ref).await? {
            return Ok(false);
        }
        if let Err(err) = self.gateway.refund(payment_ref).await {
            self.store.clear_refund_mark(payment_ref).await?;
            return Err(LeadError::Gateway(err));
        }
        info!(session = %payment_ref, "refund issued");
        Ok(true)
    }
}
