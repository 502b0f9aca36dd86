//! Custom Test Assertions
//!
//! Specialized assertion helpers for domain types that give more meaningful
//! error messages than standard assertions.

use std::collections::HashSet;

use domain_leads::Claim;

/// Asserts the two claim invariants on a job's claim set: the count stays
/// within the cap, no professional appears twice, and no payment session is
/// consumed twice
///
/// # Panics
///
/// Panics with a description of the violated invariant.
pub fn assert_claims_within_cap(claims: &[Claim], cap: u32) {
    assert!(
        claims.len() as u32 <= cap,
        "cap violated: {} claims against a cap of {cap}",
        claims.len()
    );

    let pros: HashSet<_> = claims.iter().map(|c| c.pro_id).collect();
    assert_eq!(
        pros.len(),
        claims.len(),
        "duplicate claimant: {} claims from {} professionals",
        claims.len(),
        pros.len()
    );

    let sessions: HashSet<_> = claims.iter().map(|c| &c.payment_ref).collect();
    assert_eq!(
        sessions.len(),
        claims.len(),
        "payment session consumed twice across {} claims",
        claims.len()
    );
}
