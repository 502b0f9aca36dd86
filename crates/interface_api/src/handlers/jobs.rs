//! Job handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{HomeownerId, JobId};
use domain_leads::{JobEvent, NewJob};

use super::{caller_id, require_role};
use crate::auth::{roles, Claims};
use crate::dto::jobs::*;
use crate::error::ApiError;
use crate::AppState;

/// Posts a new job
pub async fn create_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobResponse>), ApiError> {
    require_role(&claims, roles::HOMEOWNER)?;
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let owner_id = HomeownerId::from_uuid(caller_id(&claims)?);
    let job = state
        .coordinator
        .post_job(NewJob {
            owner_id,
            category: request.category,
            title: request.title,
            description: request.description,
            claim_cap: request.claim_cap,
        })
        .await?;

    let response = JobResponse::from_parts(job, 0, Some(Vec::new()));
    Ok((StatusCode::CREATED, Json(response)))
}

/// Lists job summaries, newest first
///
/// Claimant identities are never exposed here, whoever asks.
pub async fn list_jobs(
    State(state): State<AppState>,
) -> Result<Json<Vec<JobSummaryResponse>>, ApiError> {
    let summaries = state.coordinator.store().list_jobs().await?;
    Ok(Json(summaries.into_iter().map(Into::into).collect()))
}

/// Gets a job by ID
///
/// `claimedBy` appears only when the caller is the job's owner.
pub async fn get_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobResponse>, ApiError> {
    let job_id = JobId::from_uuid(id);
    let store = state.coordinator.store();

    let job = store.get_job(job_id).await?;
    let claim_count = store.claim_count(job_id).await?;

    let is_owner = caller_id(&claims)
        .map(|caller| caller == *job.owner_id.as_uuid())
        .unwrap_or(false);
    let claimed_by = if is_owner {
        let claims_on_job = store.claims_for_job(job_id).await?;
        Some(
            claims_on_job
                .into_iter()
                .map(|c| *c.pro_id.as_uuid())
                .collect(),
        )
    } else {
        None
    };

    Ok(Json(JobResponse::from_parts(job, claim_count, claimed_by)))
}

/// Applies a workflow event to a job
pub async fn post_event(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<JobEventRequest>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    require_role(&claims, roles::HOMEOWNER)?;

    let event = parse_event(&request.event)?;
    let status = state
        .coordinator
        .advance_job(JobId::from_uuid(id), event)
        .await?;

    Ok(Json(JobStatusResponse { status }))
}

fn parse_event(event: &str) -> Result<JobEvent, ApiError> {
    match event {
        "negotiate" => Ok(JobEvent::NegotiateStarted),
        "hire" => Ok(JobEvent::Hired),
        "close" => Ok(JobEvent::Close),
        "cancel" => Ok(JobEvent::Cancel),
        other => Err(ApiError::BadRequest(format!("unknown event: {other}"))),
    }
}
