//! Property-Based Test Generators
//!
//! Proptest strategies for generating random test data that maintains
//! domain invariants.

use proptest::prelude::*;

use domain_leads::{JobEvent, JobStatus};

/// Strategy for generating any job status
pub fn status_strategy() -> impl Strategy<Value = JobStatus> {
    prop_oneof![
        Just(JobStatus::Open),
        Just(JobStatus::PartiallyClaimed),
        Just(JobStatus::Full),
        Just(JobStatus::Negotiating),
        Just(JobStatus::Hired),
        Just(JobStatus::Closed),
        Just(JobStatus::Cancelled),
    ]
}

/// Strategy for generating any workflow event, with claim counts and caps
/// in the small ranges jobs actually use
pub fn event_strategy() -> impl Strategy<Value = JobEvent> {
    prop_oneof![
        (1u32..=4, 1u32..=4).prop_map(|(count, cap)| JobEvent::ClaimAdded { count, cap }),
        Just(JobEvent::NegotiateStarted),
        Just(JobEvent::Hired),
        Just(JobEvent::Close),
        Just(JobEvent::Cancel),
    ]
}

/// Strategy for generating valid claim caps
pub fn claim_cap_strategy() -> impl Strategy<Value = u32> {
    1u32..=5
}
