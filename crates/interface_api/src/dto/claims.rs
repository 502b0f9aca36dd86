//! Claim DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimJobRequest {
    pub job_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimJobResponse {
    /// Where to send the professional to pay the lead fee
    pub checkout_url: String,
    pub session_id: String,
}

/// Service-to-service form of the claim request, identity in the body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSessionRequest {
    pub job_id: Uuid,
    pub pro_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSessionResponse {
    pub url: String,
    pub session_id: String,
}
