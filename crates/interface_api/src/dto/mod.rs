//! Request/response data transfer objects
//!
//! Wire shapes are camelCase; domain types stay out of handler signatures.

pub mod claims;
pub mod jobs;
pub mod payments;
