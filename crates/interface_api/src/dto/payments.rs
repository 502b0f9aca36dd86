//! Payment confirmation DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain_leads::{JobStatus, SessionOutcome};

/// Provider webhook payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    pub job_id: Uuid,
    pub pro_id: Uuid,
    pub session_id: String,
    pub outcome: SessionOutcome,
}

/// Query parameters on the return redirect
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnQuery {
    pub job_id: Uuid,
    pub pro_id: Uuid,
    pub session_id: String,
    pub outcome: SessionOutcome,
}

/// Outcome of a payment confirmation, webhook or redirect
///
/// Both confirmation channels are idempotent: any delivery count maps to
/// one of these shapes, and replays repeat the original answer.
#[derive(Debug, Serialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum ConfirmationResponse {
    #[serde(rename_all = "camelCase")]
    Finalized {
        claim_id: Uuid,
        claim_count: u32,
        job_status: JobStatus,
        already_finalized: bool,
    },
    #[serde(rename_all = "camelCase")]
    CapExceeded { refund_issued: bool },
    DuplicateClaim,
    Ignored { outcome: SessionOutcome },
}
