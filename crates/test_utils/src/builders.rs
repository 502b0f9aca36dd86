//! Test Data Builders
//!
//! Builder patterns for constructing test data with sensible defaults.
//! Tests specify only the relevant fields and use defaults for everything
//! else.

use core_kernel::HomeownerId;
use domain_leads::{Job, NewJob};

use crate::fixtures::{IdFixtures, StringFixtures};

/// Builder for constructing test job postings
pub struct TestJobBuilder {
    owner_id: HomeownerId,
    category: String,
    title: String,
    description: String,
    claim_cap: Option<u32>,
}

impl Default for TestJobBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestJobBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            owner_id: IdFixtures::homeowner_id(),
            category: StringFixtures::category().to_string(),
            title: StringFixtures::title().to_string(),
            description: StringFixtures::description().to_string(),
            claim_cap: None,
        }
    }

    /// Sets the owning homeowner
    pub fn with_owner(mut self, owner_id: HomeownerId) -> Self {
        self.owner_id = owner_id;
        self
    }

    /// Sets the service category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Sets the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets an explicit claim cap
    pub fn with_claim_cap(mut self, cap: u32) -> Self {
        self.claim_cap = Some(cap);
        self
    }

    /// Builds the posting data
    pub fn build_new(self) -> NewJob {
        NewJob {
            owner_id: self.owner_id,
            category: self.category,
            title: self.title,
            description: self.description,
            claim_cap: self.claim_cap,
        }
    }

    /// Builds a posted job in status `Open`
    ///
    /// # Panics
    ///
    /// Panics if the builder was given invalid posting data.
    pub fn build(self) -> Job {
        Job::post(self.build_new()).expect("test job posting should be valid")
    }
}
