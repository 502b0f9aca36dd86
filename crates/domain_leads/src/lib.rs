//! Lead Claim Domain
//!
//! This crate implements the lead claim lifecycle: a homeowner's job is
//! posted open, a bounded number of professionals pay a fixed fee to claim
//! it, and the job advances through a linear status workflow.
//!
//! # Job Lifecycle
//!
//! ```text
//! Open -> PartiallyClaimed -> Full -> Negotiating -> Hired -> Closed
//!   (Cancelled reachable from any non-terminal status)
//! ```
//!
//! The hard invariant lives in [`coordinator::LeadClaimCoordinator`]: the
//! number of claims on a job never exceeds its cap, even under concurrent
//! finalization and replayed payment confirmations, and a claim is only ever
//! created from a payment the gateway reports as completed.

pub mod job;
pub mod claim;
pub mod status;
pub mod ports;
pub mod coordinator;
pub mod error;

pub use job::{Job, JobSummary, NewJob, DEFAULT_CLAIM_CAP};
pub use claim::Claim;
pub use status::{advance, InvalidTransition, JobEvent, JobStatus};
pub use ports::{
    CheckoutSession, EventOutcome, FinalizeInsert, LeadStore, PaymentGateway, SessionOutcome,
};
pub use coordinator::{lead_fee, FinalizedClaim, LeadClaimCoordinator};
pub use error::LeadError;
