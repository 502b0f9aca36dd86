//! Payment Gateway Infrastructure
//!
//! Adapters implementing [`domain_leads::PaymentGateway`]:
//!
//! - [`CheckoutGateway`] — HTTP client for the external hosted-checkout
//!   provider. Creates sessions priced at the lead fee, polls outcomes, and
//!   issues refunds. It never retries on its own; retry policy belongs to
//!   the coordinator.
//! - [`MockPaymentGateway`] — deterministic in-memory double with
//!   completion hooks and a refund call counter, used by the test suite and
//!   local development.

pub mod checkout;
pub mod mock;

pub use checkout::{CheckoutConfig, CheckoutGateway};
pub use mock::MockPaymentGateway;
