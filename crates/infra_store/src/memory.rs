//! In-memory lead store
//!
//! Backs the test suite and local development. Each job lives behind its own
//! async mutex, so `finalize_claim` and `apply_event` are one critical
//! section per job: the payment-ref re-check, the duplicate check, the
//! recount, and the insert happen with no interleaving, while claims on
//! different jobs proceed in parallel.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use core_kernel::{DomainPort, JobId, PaymentRef, PortError, ProId};
use domain_leads::{
    advance, Claim, EventOutcome, FinalizeInsert, Job, JobEvent, JobSummary, LeadStore,
};

struct JobRecord {
    job: Job,
    claims: Vec<Claim>,
}

/// Non-durable [`LeadStore`] with per-job serialization
#[derive(Default)]
pub struct InMemoryLeadStore {
    jobs: RwLock<HashMap<JobId, Arc<Mutex<JobRecord>>>>,
    refunds: Mutex<HashSet<PaymentRef>>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn record(&self, job_id: JobId) -> Result<Arc<Mutex<JobRecord>>, PortError> {
        self.jobs
            .read()
            .await
            .get(&job_id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Job", job_id))
    }
}

impl DomainPort for InMemoryLeadStore {}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn create_job(&self, job: &Job) -> Result<(), PortError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(PortError::conflict(format!("job {} already exists", job.id)));
        }
        jobs.insert(
            job.id,
            Arc::new(Mutex::new(JobRecord {
                job: job.clone(),
                claims: Vec::new(),
            })),
        );
        Ok(())
    }

    async fn get_job(&self, job_id: JobId) -> Result<Job, PortError> {
        let record = self.record(job_id).await?;
        let guard = record.lock().await;
        Ok(guard.job.clone())
    }

    async fn list_jobs(&self) -> Result<Vec<JobSummary>, PortError> {
        let handles: Vec<Arc<Mutex<JobRecord>>> =
            self.jobs.read().await.values().cloned().collect();

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            let guard = handle.lock().await;
            summaries.push(JobSummary {
                id: guard.job.id,
                category: guard.job.category.clone(),
                title: guard.job.title.clone(),
                description: guard.job.description.clone(),
                status: guard.job.status,
                claim_count: guard.claims.len() as u32,
                claim_cap: guard.job.claim_cap,
                created_at: guard.job.created_at,
            });
        }
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    async fn claim_count(&self, job_id: JobId) -> Result<u32, PortError> {
        let record = self.record(job_id).await?;
        let guard = record.lock().await;
        Ok(guard.claims.len() as u32)
    }

    async fn find_claim(
        &self,
        job_id: JobId,
        pro_id: ProId,
    ) -> Result<Option<Claim>, PortError> {
        let record = self.record(job_id).await?;
        let guard = record.lock().await;
        Ok(guard.claims.iter().find(|c| c.pro_id == pro_id).cloned())
    }

    async fn claims_for_job(&self, job_id: JobId) -> Result<Vec<Claim>, PortError> {
        let record = self.record(job_id).await?;
        let guard = record.lock().await;
        Ok(guard.claims.clone())
    }

    async fn finalize_claim(
        &self,
        job_id: JobId,
        pro_id: ProId,
        payment_ref: &PaymentRef,
    ) -> Result<FinalizeInsert, PortError> {
        let record = self.record(job_id).await?;
        let mut guard = record.lock().await;
        let cap = guard.job.claim_cap;

        if let Some(existing) = guard
            .claims
            .iter()
            .find(|c| &c.payment_ref == payment_ref)
            .cloned()
        {
            let count = guard.claims.len() as u32;
            return Ok(FinalizeInsert::AlreadyRecorded {
                claim: existing,
                count,
                cap,
            });
        }

        if let Some(existing) = guard.claims.iter().find(|c| c.pro_id == pro_id).cloned() {
            return Ok(FinalizeInsert::DuplicateClaim { existing });
        }

        // A terminal job has no slots left to sell, whatever its count.
        if guard.job.status.is_terminal() {
            return Ok(FinalizeInsert::CapExceeded { cap });
        }

        let count = guard.claims.len() as u32;
        if count >= cap {
            return Ok(FinalizeInsert::CapExceeded { cap });
        }

        let claim = Claim::record(job_id, pro_id, payment_ref.clone());
        guard.claims.push(claim.clone());
        let new_count = guard.claims.len() as u32;
        debug!(%job_id, %pro_id, new_count, "claim inserted");

        Ok(FinalizeInsert::Inserted {
            claim,
            new_count,
            cap,
        })
    }

    async fn apply_event(
        &self,
        job_id: JobId,
        event: JobEvent,
    ) -> Result<EventOutcome, PortError> {
        let record = self.record(job_id).await?;
        let mut guard = record.lock().await;

        match advance(guard.job.status, event) {
            Ok(next) => {
                guard.job.status = next;
                Ok(EventOutcome::Advanced(next))
            }
            Err(rejected) => Ok(EventOutcome::Rejected { from: rejected.from }),
        }
    }

    async fn try_mark_refunded(&self, payment_ref: &PaymentRef) -> Result<bool, PortError> {
        let mut refunds = self.refunds.lock().await;
        Ok(refunds.insert(payment_ref.clone()))
    }

    async fn clear_refund_mark(&self, payment_ref: &PaymentRef) -> Result<(), PortError> {
        let mut refunds = self.refunds.lock().await;
        refunds.remove(payment_ref);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::HomeownerId;
    use domain_leads::NewJob;

    fn job() -> Job {
        Job::post(NewJob {
            owner_id: HomeownerId::new(),
            category: "roofing".to_string(),
            title: "Patch shingles".to_string(),
            description: "Wind damage over the garage".to_string(),
            claim_cap: None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_job() {
        let store = InMemoryLeadStore::new();
        let job = job();
        store.create_job(&job).await.unwrap();

        let loaded = store.get_job(job.id).await.unwrap();
        assert_eq!(loaded.id, job.id);
        assert_eq!(loaded.title, job.title);

        let missing = store.get_job(JobId::new()).await;
        assert!(matches!(missing, Err(e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let store = InMemoryLeadStore::new();
        let job = job();
        store.create_job(&job).await.unwrap();
        assert!(store.create_job(&job).await.is_err());
    }

    #[tokio::test]
    async fn test_finalize_replay_returns_same_claim() {
        let store = InMemoryLeadStore::new();
        let job = job();
        store.create_job(&job).await.unwrap();
        let pro = ProId::new();
        let payment_ref = PaymentRef::from("cs_1");

        let first = store.finalize_claim(job.id, pro, &payment_ref).await.unwrap();
        let FinalizeInsert::Inserted { claim, new_count, .. } = first else {
            panic!("expected insert");
        };
        assert_eq!(new_count, 1);

        let replay = store.finalize_claim(job.id, pro, &payment_ref).await.unwrap();
        let FinalizeInsert::AlreadyRecorded { claim: replayed, count, .. } = replay else {
            panic!("expected replay");
        };
        assert_eq!(replayed, claim);
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_cap_enforced() {
        let store = InMemoryLeadStore::new();
        let job = job();
        store.create_job(&job).await.unwrap();

        for i in 0..2 {
            let outcome = store
                .finalize_claim(job.id, ProId::new(), &PaymentRef::from(format!("cs_{i}")))
                .await
                .unwrap();
            assert!(matches!(outcome, FinalizeInsert::Inserted { .. }));
        }

        let rejected = store
            .finalize_claim(job.id, ProId::new(), &PaymentRef::from("cs_late"))
            .await
            .unwrap();
        assert!(matches!(rejected, FinalizeInsert::CapExceeded { cap: 2 }));
        assert_eq!(store.claim_count(job.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_refund_mark_is_test_and_set() {
        let store = InMemoryLeadStore::new();
        let payment_ref = PaymentRef::from("cs_refund");

        assert!(store.try_mark_refunded(&payment_ref).await.unwrap());
        assert!(!store.try_mark_refunded(&payment_ref).await.unwrap());

        store.clear_refund_mark(&payment_ref).await.unwrap();
        assert!(store.try_mark_refunded(&payment_ref).await.unwrap());
    }
}
