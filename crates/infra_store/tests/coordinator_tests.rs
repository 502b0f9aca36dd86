//! Coordinator scenarios against the in-memory store and mock gateway
//!
//! These are the end-to-end claim-path tests: request, pay, finalize, and
//! the compensation paths when a paid session loses the race for a slot.

use std::sync::Arc;

use core_kernel::{PaymentRef, ProId};
use domain_leads::{
    CheckoutSession, Job, JobEvent, JobStatus, LeadClaimCoordinator, LeadError, LeadStore,
    SessionOutcome,
};
use infra_payments::MockPaymentGateway;
use infra_store::InMemoryLeadStore;
use test_utils::{assert_claims_within_cap, MoneyFixtures, TestJobBuilder};

struct Harness {
    store: Arc<InMemoryLeadStore>,
    gateway: Arc<MockPaymentGateway>,
    coordinator: Arc<LeadClaimCoordinator>,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryLeadStore::new());
    let gateway = Arc::new(MockPaymentGateway::new());
    let coordinator = Arc::new(LeadClaimCoordinator::with_fee(
        store.clone(),
        gateway.clone(),
        MoneyFixtures::lead_fee(),
    ));
    Harness {
        store,
        gateway,
        coordinator,
    }
}

async fn post_job(h: &Harness) -> Job {
    h.coordinator
        .post_job(TestJobBuilder::new().build_new())
        .await
        .unwrap()
}

/// Opens a session for the pro and completes payment on it
async fn paid_session(h: &Harness, job: &Job, pro: ProId) -> CheckoutSession {
    let session = h.coordinator.request_claim(job.id, pro).await.unwrap();
    h.gateway.complete_session(&session.session_id).await;
    session
}

#[tokio::test]
async fn test_two_claims_fill_the_job_and_the_third_is_refunded() {
    let h = harness();
    let job = post_job(&h).await;
    let (pro_a, pro_b, pro_c) = (ProId::new(), ProId::new(), ProId::new());

    // All three pros open and pay their sessions while the job is still open.
    let session_a = paid_session(&h, &job, pro_a).await;
    let session_b = paid_session(&h, &job, pro_b).await;
    let session_c = paid_session(&h, &job, pro_c).await;

    // Every session was opened at the configured fee.
    assert_eq!(
        h.gateway.session_amount(&session_a.session_id).await,
        Some(MoneyFixtures::lead_fee())
    );

    let first = h
        .coordinator
        .finalize_claim(job.id, pro_a, session_a.session_id.clone())
        .await
        .unwrap();
    assert_eq!(first.claim_count, 1);
    assert_eq!(first.job_status, JobStatus::PartiallyClaimed);
    assert!(!first.already_finalized);

    let second = h
        .coordinator
        .finalize_claim(job.id, pro_b, session_b.session_id.clone())
        .await
        .unwrap();
    assert_eq!(second.claim_count, 2);
    assert_eq!(second.job_status, JobStatus::Full);

    // The third paid session finds no slot left and gets its fee back.
    let third = h
        .coordinator
        .finalize_claim(job.id, pro_c, session_c.session_id.clone())
        .await;
    assert!(matches!(
        third,
        Err(LeadError::CapExceeded {
            refund_issued: true
        })
    ));
    assert_eq!(h.gateway.refund_calls(&session_c.session_id).await, 1);

    // The losing finalize left no trace on the job.
    let loaded = h.store.get_job(job.id).await.unwrap();
    assert_eq!(loaded.status, JobStatus::Full);
    assert_eq!(h.store.claims_for_job(job.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_finalize_is_idempotent_per_session() {
    let h = harness();
    let job = post_job(&h).await;
    let pro = ProId::new();
    let session = paid_session(&h, &job, pro).await;

    let first = h
        .coordinator
        .finalize_claim(job.id, pro, session.session_id.clone())
        .await
        .unwrap();
    let replay = h
        .coordinator
        .finalize_claim(job.id, pro, session.session_id.clone())
        .await
        .unwrap();

    assert_eq!(replay.claim.id, first.claim.id);
    assert_eq!(replay.claim_count, 1);
    assert!(replay.already_finalized);
    assert_eq!(h.store.claims_for_job(job.id).await.unwrap().len(), 1);
    assert_eq!(h.gateway.total_refund_calls().await, 0);
}

#[tokio::test]
async fn test_second_session_by_same_pro_is_refunded_once() {
    let h = harness();
    let job = post_job(&h).await;
    let pro = ProId::new();

    // The pro opened two sessions before either was finalized, and paid both.
    let session_1 = paid_session(&h, &job, pro).await;
    let session_2 = paid_session(&h, &job, pro).await;

    h.coordinator
        .finalize_claim(job.id, pro, session_1.session_id.clone())
        .await
        .unwrap();

    let second = h
        .coordinator
        .finalize_claim(job.id, pro, session_2.session_id.clone())
        .await;
    assert!(matches!(second, Err(LeadError::DuplicateClaim)));
    assert_eq!(h.gateway.refund_calls(&session_2.session_id).await, 1);

    // Replaying the losing confirmation does not refund again.
    let replayed = h
        .coordinator
        .finalize_claim(job.id, pro, session_2.session_id.clone())
        .await;
    assert!(matches!(replayed, Err(LeadError::DuplicateClaim)));
    assert_eq!(h.gateway.refund_calls(&session_2.session_id).await, 1);

    assert_eq!(h.store.claims_for_job(job.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unpaid_sessions_never_finalize() {
    let h = harness();
    let job = post_job(&h).await;
    let pro = ProId::new();

    let pending = h.coordinator.request_claim(job.id, pro).await.unwrap();
    let result = h
        .coordinator
        .finalize_claim(job.id, pro, pending.session_id.clone())
        .await;
    assert!(matches!(
        result,
        Err(LeadError::PaymentNotConfirmed {
            outcome: SessionOutcome::Pending
        })
    ));

    h.gateway.cancel_session(&pending.session_id).await;
    let result = h
        .coordinator
        .finalize_claim(job.id, pro, pending.session_id.clone())
        .await;
    assert!(matches!(
        result,
        Err(LeadError::PaymentNotConfirmed {
            outcome: SessionOutcome::Cancelled
        })
    ));

    // A made-up reference is unknown, not an error.
    let result = h
        .coordinator
        .finalize_claim(job.id, pro, PaymentRef::from("cs_forged"))
        .await;
    assert!(matches!(
        result,
        Err(LeadError::PaymentNotConfirmed {
            outcome: SessionOutcome::Unknown
        })
    ));

    assert_eq!(h.store.claim_count(job.id).await.unwrap(), 0);
    let loaded = h.store.get_job(job.id).await.unwrap();
    assert_eq!(loaded.status, JobStatus::Open);
}

#[tokio::test]
async fn test_request_claim_rejections() {
    let h = harness();
    let job = post_job(&h).await;

    // First slot taken; the holder cannot open a second session.
    let holder = ProId::new();
    let session = paid_session(&h, &job, holder).await;
    h.coordinator
        .finalize_claim(job.id, holder, session.session_id)
        .await
        .unwrap();
    let again = h.coordinator.request_claim(job.id, holder).await;
    assert!(matches!(again, Err(LeadError::DuplicateClaim)));

    // Second slot taken; newcomers are turned away at request time.
    let other = ProId::new();
    let session = paid_session(&h, &job, other).await;
    h.coordinator
        .finalize_claim(job.id, other, session.session_id)
        .await
        .unwrap();
    let late = h.coordinator.request_claim(job.id, ProId::new()).await;
    assert!(matches!(late, Err(LeadError::JobFull)));

    h.coordinator.advance_job(job.id, JobEvent::Cancel).await.unwrap();
    let after_cancel = h.coordinator.request_claim(job.id, ProId::new()).await;
    assert!(matches!(
        after_cancel,
        Err(LeadError::JobNotOpen(JobStatus::Cancelled))
    ));

    // Missing job surfaces as not-found.
    let missing = h
        .coordinator
        .request_claim(core_kernel::JobId::new(), ProId::new())
        .await;
    assert!(matches!(missing, Err(LeadError::JobNotFound)));
}

#[tokio::test]
async fn test_session_failure_is_retry_safe() {
    let h = harness();
    let job = post_job(&h).await;
    let pro = ProId::new();

    h.gateway.fail_next_create();
    let failed = h.coordinator.request_claim(job.id, pro).await;
    assert!(matches!(failed, Err(LeadError::PaymentSessionFailed(_))));

    // Nothing was persisted, so the same request simply works on retry.
    assert!(h.coordinator.request_claim(job.id, pro).await.is_ok());
    assert_eq!(h.store.claim_count(job.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_workflow_advances_through_hire_and_close() {
    let h = harness();
    let job = post_job(&h).await;
    let pro = ProId::new();
    let session = paid_session(&h, &job, pro).await;
    h.coordinator
        .finalize_claim(job.id, pro, session.session_id)
        .await
        .unwrap();

    let status = h
        .coordinator
        .advance_job(job.id, JobEvent::NegotiateStarted)
        .await
        .unwrap();
    assert_eq!(status, JobStatus::Negotiating);

    let status = h.coordinator.advance_job(job.id, JobEvent::Hired).await.unwrap();
    assert_eq!(status, JobStatus::Hired);

    let status = h.coordinator.advance_job(job.id, JobEvent::Close).await.unwrap();
    assert_eq!(status, JobStatus::Closed);

    // Explicit events against the wrong status are surfaced, not swallowed.
    let stuck = h.coordinator.advance_job(job.id, JobEvent::Cancel).await;
    assert!(matches!(
        stuck,
        Err(LeadError::InvalidTransition {
            from: JobStatus::Closed,
            ..
        })
    ));
}

#[tokio::test]
async fn test_claims_on_negotiating_job_are_refused() {
    let h = harness();
    let job = post_job(&h).await;
    let pro = ProId::new();
    let session = paid_session(&h, &job, pro).await;
    h.coordinator
        .finalize_claim(job.id, pro, session.session_id)
        .await
        .unwrap();

    h.coordinator
        .advance_job(job.id, JobEvent::NegotiateStarted)
        .await
        .unwrap();

    let refused = h.coordinator.request_claim(job.id, ProId::new()).await;
    assert!(matches!(
        refused,
        Err(LeadError::JobNotOpen(JobStatus::Negotiating))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_finalizes_respect_the_cap() {
    let h = harness();
    let job = post_job(&h).await;

    // Five pros, all paid up, racing for two slots.
    let mut contenders = Vec::new();
    for _ in 0..5 {
        let pro = ProId::new();
        let session = paid_session(&h, &job, pro).await;
        contenders.push((pro, session.session_id));
    }

    let mut handles = Vec::new();
    for (pro, payment_ref) in contenders {
        let coordinator = h.coordinator.clone();
        let job_id = job.id;
        handles.push(tokio::spawn(async move {
            coordinator.finalize_claim(job_id, pro, payment_ref).await
        }));
    }

    let mut won = 0;
    let mut refunded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(finalized) => {
                assert!(!finalized.already_finalized);
                won += 1;
            }
            Err(LeadError::CapExceeded { refund_issued }) => {
                assert!(refund_issued);
                refunded += 1;
            }
            Err(other) => panic!("unexpected outcome: {other}"),
        }
    }

    assert_eq!(won, 2);
    assert_eq!(refunded, 3);
    let claims = h.store.claims_for_job(job.id).await.unwrap();
    assert_claims_within_cap(&claims, 2);
    assert_eq!(claims.len(), 2);
    assert_eq!(h.gateway.total_refund_calls().await, 3);

    let loaded = h.store.get_job(job.id).await.unwrap();
    assert_eq!(loaded.status, JobStatus::Full);
}
