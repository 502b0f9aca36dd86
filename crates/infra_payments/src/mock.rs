//! Mock payment gateway
//!
//! Deterministic in-memory double for the checkout provider. Sessions are
//! created `Pending`; tests flip them with [`MockPaymentGateway::complete_session`]
//! or [`MockPaymentGateway::cancel_session`] to simulate what the hosted
//! checkout page would do, and assert on the refund call counter.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use core_kernel::{DomainPort, JobId, Money, PaymentRef, PortError, ProId};
use domain_leads::{CheckoutSession, PaymentGateway, SessionOutcome};

struct MockSession {
    job_id: JobId,
    pro_id: ProId,
    amount: Money,
    outcome: SessionOutcome,
}

/// In-memory [`PaymentGateway`] with test hooks
#[derive(Default)]
pub struct MockPaymentGateway {
    sessions: Mutex<HashMap<PaymentRef, MockSession>>,
    refund_calls: Mutex<HashMap<PaymentRef, u32>>,
    next_id: AtomicU64,
    fail_next_create: AtomicBool,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates the professional completing payment on the hosted page
    pub async fn complete_session(&self, session_id: &PaymentRef) {
        if let Some(session) = self.sessions.lock().await.get_mut(session_id) {
            session.outcome = SessionOutcome::Completed;
        }
    }

    /// Simulates the professional abandoning or cancelling the session
    pub async fn cancel_session(&self, session_id: &PaymentRef) {
        if let Some(session) = self.sessions.lock().await.get_mut(session_id) {
            session.outcome = SessionOutcome::Cancelled;
        }
    }

    /// Makes the next `create_session` fail with a service error
    pub fn fail_next_create(&self) {
        self.fail_next_create.store(true, Ordering::SeqCst);
    }

    /// Number of refund calls the provider received for a session
    pub async fn refund_calls(&self, session_id: &PaymentRef) -> u32 {
        self.refund_calls
            .lock()
            .await
            .get(session_id)
            .copied()
            .unwrap_or(0)
    }

    /// Total refund calls across all sessions
    pub async fn total_refund_calls(&self) -> u32 {
        self.refund_calls.lock().await.values().sum()
    }

    /// The `(job, pro)` pair a session was tagged with
    pub async fn session_tag(&self, session_id: &PaymentRef) -> Option<(JobId, ProId)> {
        self.sessions
            .lock()
            .await
            .get(session_id)
            .map(|s| (s.job_id, s.pro_id))
    }

    /// The amount the session was opened for
    pub async fn session_amount(&self, session_id: &PaymentRef) -> Option<Money> {
        self.sessions.lock().await.get(session_id).map(|s| s.amount)
    }
}

impl DomainPort for MockPaymentGateway {}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_session(
        &self,
        job_id: JobId,
        pro_id: ProId,
        amount: Money,
    ) -> Result<CheckoutSession, PortError> {
        if self.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err(PortError::ServiceUnavailable {
                service: "mock checkout provider".to_string(),
            });
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let session_id = PaymentRef::new(format!("cs_mock_{n}"));

        self.sessions.lock().await.insert(
            session_id.clone(),
            MockSession {
                job_id,
                pro_id,
                amount,
                outcome: SessionOutcome::Pending,
            },
        );

        Ok(CheckoutSession {
            redirect_url: format!("https://pay.example.com/checkout/{}", session_id),
            session_id,
        })
    }

    async fn outcome(&self, session_id: &PaymentRef) -> Result<SessionOutcome, PortError> {
        Ok(self
            .sessions
            .lock()
            .await
            .get(session_id)
            .map(|s| s.outcome)
            .unwrap_or(SessionOutcome::Unknown))
    }

    async fn refund(&self, session_id: &PaymentRef) -> Result<(), PortError> {
        if !self.sessions.lock().await.contains_key(session_id) {
            return Err(PortError::not_found("PaymentSession", session_id));
        }
        *self
            .refund_calls
            .lock()
            .await
            .entry(session_id.clone())
            .or_insert(0) += 1;
        Ok(())
    }
}
