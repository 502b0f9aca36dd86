//! Payment confirmation handlers
//!
//! Two unauthenticated channels deliver the same confirmation: the
//! provider's webhook (authoritative, retried until acknowledged) and the
//! browser return redirect (best-effort, the pro may close the tab). Both
//! funnel into the coordinator's idempotent finalize, and neither trusts
//! the delivered outcome: completion is re-verified against the gateway.

use axum::{
    extract::{Query, State},
    Json,
};
use tracing::info;
use uuid::Uuid;

use core_kernel::{JobId, PaymentRef, ProId};
use domain_leads::{LeadError, SessionOutcome};

use crate::dto::payments::*;
use crate::error::ApiError;
use crate::AppState;

/// Provider webhook for session outcomes
///
/// Non-5xx responses acknowledge the delivery; anything the coordinator
/// resolved (including losing the cap race) answers 200 so the provider
/// stops retrying.
pub async fn payment_webhook(
    State(state): State<AppState>,
    Json(request): Json<WebhookRequest>,
) -> Result<Json<ConfirmationResponse>, ApiError> {
    info!(session = %request.session_id, outcome = ?request.outcome, "payment webhook received");
    confirm(
        &state,
        request.job_id,
        request.pro_id,
        request.session_id,
        request.outcome,
    )
    .await
    .map(Json)
}

/// Browser return redirect after hosted checkout
pub async fn payment_return(
    State(state): State<AppState>,
    Query(query): Query<ReturnQuery>,
) -> Result<Json<ConfirmationResponse>, ApiError> {
    confirm(
        &state,
        query.job_id,
        query.pro_id,
        query.session_id,
        query.outcome,
    )
    .await
    .map(Json)
}

async fn confirm(
    state: &AppState,
    job_id: Uuid,
    pro_id: Uuid,
    session_id: String,
    outcome: SessionOutcome,
) -> Result<ConfirmationResponse, ApiError> {
    // The delivered outcome only gates the attempt; completion itself is
    // verified against the gateway inside finalize.
    if outcome != SessionOutcome::Completed {
        return Ok(ConfirmationResponse::Ignored { outcome });
    }

    let result = state
        .coordinator
        .finalize_claim(
            JobId::from_uuid(job_id),
            ProId::from_uuid(pro_id),
            PaymentRef::new(session_id),
        )
        .await;

    match result {
        Ok(finalized) => Ok(ConfirmationResponse::Finalized {
            claim_id: *finalized.claim.id.as_uuid(),
            claim_count: finalized.claim_count,
            job_status: finalized.job_status,
            already_finalized: finalized.already_finalized,
        }),
        Err(LeadError::CapExceeded { refund_issued }) => {
            Ok(ConfirmationResponse::CapExceeded { refund_issued })
        }
        Err(LeadError::DuplicateClaim) => Ok(ConfirmationResponse::DuplicateClaim),
        Err(LeadError::PaymentNotConfirmed { outcome }) => {
            Ok(ConfirmationResponse::Ignored { outcome })
        }
        Err(other) => Err(other.into()),
    }
}
