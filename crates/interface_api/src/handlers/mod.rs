//! Request handlers

pub mod claims;
pub mod health;
pub mod jobs;
pub mod payments;

use uuid::Uuid;

use crate::auth::{self, Claims};
use crate::error::ApiError;

/// The authenticated caller's identity
///
/// Tokens for homeowners and professionals carry their party id as the
/// subject; anything else cannot act as a person.
pub(crate) fn caller_id(claims: &Claims) -> Result<Uuid, ApiError> {
    auth::subject_id(claims).ok_or(ApiError::Unauthorized)
}

/// Rejects callers without the required role
pub(crate) fn require_role(claims: &Claims, role: &str) -> Result<(), ApiError> {
    if auth::has_role(claims, role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!("requires role: {role}")))
    }
}
