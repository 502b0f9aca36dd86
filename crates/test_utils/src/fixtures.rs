//! Pre-built Test Fixtures
//!
//! Ready-to-use test data for common entities across the lead marketplace.
//! These fixtures are designed to be consistent and predictable for unit
//! tests.

use core_kernel::{Currency, HomeownerId, JobId, Money, PaymentRef, ProId};
use rust_decimal_macros::dec;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// The standard lead fee
    pub fn lead_fee() -> Money {
        Money::new(dec!(10.00), Currency::USD)
    }
}

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    pub fn job_id() -> JobId {
        JobId::new_v7()
    }

    pub fn homeowner_id() -> HomeownerId {
        HomeownerId::new()
    }

    pub fn pro_id() -> ProId {
        ProId::new()
    }

    /// A provider-shaped checkout session reference
    pub fn payment_ref(n: u32) -> PaymentRef {
        PaymentRef::new(format!("cs_test_{n:04}"))
    }
}

/// Fixture for job posting text fields
pub struct StringFixtures;

impl StringFixtures {
    pub fn category() -> &'static str {
        "plumbing"
    }

    pub fn title() -> &'static str {
        "Leaking kitchen sink"
    }

    pub fn description() -> &'static str {
        "Slow drip under the basin, cabinet floor is warping"
    }
}
