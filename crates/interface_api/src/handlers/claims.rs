//! Claim handlers

use axum::{extract::State, Extension, Json};

use core_kernel::{JobId, ProId};

use super::{caller_id, require_role};
use crate::auth::{roles, Claims};
use crate::dto::claims::*;
use crate::error::ApiError;
use crate::AppState;

/// Opens a checkout session for the caller to claim a job
///
/// Nothing is persisted here; the claim exists once payment is confirmed.
pub async fn claim_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<ClaimJobRequest>,
) -> Result<Json<ClaimJobResponse>, ApiError> {
    require_role(&claims, roles::PRO)?;
    let pro_id = ProId::from_uuid(caller_id(&claims)?);

    let session = state
        .coordinator
        .request_claim(JobId::from_uuid(request.job_id), pro_id)
        .await?;

    Ok(Json(ClaimJobResponse {
        checkout_url: session.redirect_url,
        session_id: session.session_id.to_string(),
    }))
}

/// Service-to-service session creation with the pro identity in the body
pub async fn create_payment_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<PaymentSessionRequest>,
) -> Result<Json<PaymentSessionResponse>, ApiError> {
    require_role(&claims, roles::SERVICE)?;

    let session = state
        .coordinator
        .request_claim(
            JobId::from_uuid(request.job_id),
            ProId::from_uuid(request.pro_id),
        )
        .await?;

    Ok(Json(PaymentSessionResponse {
        url: session.redirect_url,
        session_id: session.session_id.to_string(),
    }))
}
