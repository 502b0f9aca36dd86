//! Claim record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, JobId, PaymentRef, ProId};

/// A paid reservation by one professional against one job
///
/// Claims are created only by the coordinator's finalize step, after the
/// gateway has reported the payment session completed. `payment_ref` is
/// unique across all claims; a replayed confirmation for the same session
/// finds the existing row instead of creating another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Unique identifier
    pub id: ClaimId,
    /// Owning job
    pub job_id: JobId,
    /// Claiming professional
    pub pro_id: ProId,
    /// External payment session that paid for this claim
    pub payment_ref: PaymentRef,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Claim {
    /// Builds the record for a confirmed payment session
    pub fn record(job_id: JobId, pro_id: ProId, payment_ref: PaymentRef) -> Self {
        Self {
            id: ClaimId::new_v7(),
            job_id,
            pro_id,
            payment_ref,
            created_at: Utc::now(),
        }
    }
}
