//! PostgreSQL lead store
//!
//! Repository implementation of [`LeadStore`]. The atomic finalize step is
//! one transaction that locks the job row (`SELECT ... FOR UPDATE`), so
//! finalize attempts on the same job serialize across every process sharing
//! the database while other jobs stay unblocked. Unique indexes on
//! `(job_id, pro_id)` and `payment_ref` back the same invariants durably.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use core_kernel::{DomainPort, HomeownerId, JobId, PaymentRef, PortError, ProId};
use domain_leads::{
    advance, Claim, EventOutcome, FinalizeInsert, Job, JobEvent, JobStatus, JobSummary, LeadStore,
};

use crate::error::DatabaseError;

/// Repository for jobs, claims, and refund marks
#[derive(Debug, Clone)]
pub struct PostgresLeadStore {
    pool: PgPool,
}

impl PostgresLeadStore {
    /// Creates a new store over the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the schema migrations in `migrations/`
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))
    }

    async fn fetch_job(&self, job_id: JobId) -> Result<Job, DatabaseError> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, category, title, description, status, claim_cap, created_at
            FROM jobs
            WHERE id = $1
            "#,
        )
        .bind(job_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Job", job_id))?;

        job_from_row(&row)
    }
}

impl DomainPort for PostgresLeadStore {}

#[async_trait]
impl LeadStore for PostgresLeadStore {
    async fn create_job(&self, job: &Job) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO jobs (id, owner_id, category, title, description, status, claim_cap, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(job.id.as_uuid())
        .bind(job.owner_id.as_uuid())
        .bind(&job.category)
        .bind(&job.title)
        .bind(&job.description)
        .bind(job.status.as_str())
        .bind(job.claim_cap as i32)
        .bind(job.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::from(DatabaseError::from(&e)))?;

        Ok(())
    }

    async fn get_job(&self, job_id: JobId) -> Result<Job, PortError> {
        self.fetch_job(job_id).await.map_err(PortError::from)
    }

    async fn list_jobs(&self) -> Result<Vec<JobSummary>, PortError> {
        let rows = sqlx::query(
            r#"
            SELECT j.id, j.category, j.title, j.description, j.status, j.claim_cap,
                   j.created_at, COUNT(c.id) AS claim_count
            FROM jobs j
            LEFT JOIN claims c ON c.job_id = j.id
            GROUP BY j.id
            ORDER BY j.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::from(DatabaseError::from(&e)))?;

        rows.iter()
            .map(|row| summary_from_row(row).map_err(PortError::from))
            .collect()
    }

    async fn claim_count(&self, job_id: JobId) -> Result<u32, PortError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM claims WHERE job_id = $1")
            .bind(job_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PortError::from(DatabaseError::from(&e)))?;

        Ok(count as u32)
    }

    async fn find_claim(
        &self,
        job_id: JobId,
        pro_id: ProId,
    ) -> Result<Option<Claim>, PortError> {
        let row = sqlx::query(
            r#"
            SELECT id, job_id, pro_id, payment_ref, created_at
            FROM claims
            WHERE job_id = $1 AND pro_id = $2
            "#,
        )
        .bind(job_id.as_uuid())
        .bind(pro_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::from(DatabaseError::from(&e)))?;

        row.map(|r| claim_from_row(&r).map_err(PortError::from))
            .transpose()
    }

    async fn claims_for_job(&self, job_id: JobId) -> Result<Vec<Claim>, PortError> {
        let rows = sqlx::query(
            r#"
            SELECT id, job_id, pro_id, payment_ref, created_at
            FROM claims
            WHERE job_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(job_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::from(DatabaseError::from(&e)))?;

        rows.iter()
            .map(|row| claim_from_row(row).map_err(PortError::from))
            .collect()
    }

    async fn finalize_claim(
        &self,
        job_id: JobId,
        pro_id: ProId,
        payment_ref: &PaymentRef,
    ) -> Result<FinalizeInsert, PortError> {
        let result: Result<FinalizeInsert, DatabaseError> = async {
            let mut tx = self.pool.begin().await?;

            // Serialize all finalize attempts on this job; other jobs are
            // untouched.
            let job_row = sqlx::query(
                r#"
                SELECT id, owner_id, category, title, description, status, claim_cap, created_at
                FROM jobs
                WHERE id = $1
                FOR UPDATE
                "#,
            )
            .bind(job_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Job", job_id))?;

            let job = job_from_row(&job_row)?;
            let cap = job.claim_cap;

            if let Some(row) = sqlx::query(
                r#"
                SELECT id, job_id, pro_id, payment_ref, created_at
                FROM claims
                WHERE payment_ref = $1
                "#,
            )
            .bind(payment_ref.as_str())
            .fetch_optional(&mut *tx)
            .await?
            {
                let claim = claim_from_row(&row)?;
                let count: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM claims WHERE job_id = $1")
                        .bind(job_id.as_uuid())
                        .fetch_one(&mut *tx)
                        .await?;
                tx.commit().await?;
                return Ok(FinalizeInsert::AlreadyRecorded {
                    claim,
                    count: count as u32,
                    cap,
                });
            }

            if let Some(row) = sqlx::query(
                r#"
                SELECT id, job_id, pro_id, payment_ref, created_at
                FROM claims
                WHERE job_id = $1 AND pro_id = $2
                "#,
            )
            .bind(job_id.as_uuid())
            .bind(pro_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?
            {
                let existing = claim_from_row(&row)?;
                tx.commit().await?;
                return Ok(FinalizeInsert::DuplicateClaim { existing });
            }

            // A terminal job has no slots left to sell, whatever its count.
            if job.status.is_terminal() {
                tx.commit().await?;
                return Ok(FinalizeInsert::CapExceeded { cap });
            }

            let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM claims WHERE job_id = $1")
                .bind(job_id.as_uuid())
                .fetch_one(&mut *tx)
                .await?;

            if count as u32 >= cap {
                tx.commit().await?;
                return Ok(FinalizeInsert::CapExceeded { cap });
            }

            let claim = Claim::record(job_id, pro_id, payment_ref.clone());
            sqlx::query(
                r#"
                INSERT INTO claims (id, job_id, pro_id, payment_ref, created_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(claim.id.as_uuid())
            .bind(claim.job_id.as_uuid())
            .bind(claim.pro_id.as_uuid())
            .bind(claim.payment_ref.as_str())
            .bind(claim.created_at)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;

            let new_count = count as u32 + 1;
            debug!(%job_id, %pro_id, new_count, "claim inserted");
            Ok(FinalizeInsert::Inserted {
                claim,
                new_count,
                cap,
            })
        }
        .await;

        result.map_err(PortError::from)
    }

    async fn apply_event(
        &self,
        job_id: JobId,
        event: JobEvent,
    ) -> Result<EventOutcome, PortError> {
        let result: Result<EventOutcome, DatabaseError> = async {
            let mut tx = self.pool.begin().await?;

            let status_str: String =
                sqlx::query_scalar("SELECT status FROM jobs WHERE id = $1 FOR UPDATE")
                    .bind(job_id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await?
                    .ok_or_else(|| DatabaseError::not_found("Job", job_id))?;

            let status = parse_status(&status_str)?;

            match advance(status, event) {
                Ok(next) => {
                    sqlx::query("UPDATE jobs SET status = $2 WHERE id = $1")
                        .bind(job_id.as_uuid())
                        .bind(next.as_str())
                        .execute(&mut *tx)
                        .await?;

                    // Status history rides in the same transaction.
                    sqlx::query(
                        r#"
                        INSERT INTO job_status_history (id, job_id, status, changed_at)
                        VALUES ($1, $2, $3, $4)
                        "#,
                    )
                    .bind(Uuid::new_v4())
                    .bind(job_id.as_uuid())
                    .bind(next.as_str())
                    .bind(Utc::now())
                    .execute(&mut *tx)
                    .await?;

                    tx.commit().await?;
                    Ok(EventOutcome::Advanced(next))
                }
                Err(rejected) => {
                    tx.rollback().await?;
                    Ok(EventOutcome::Rejected { from: rejected.from })
                }
            }
        }
        .await;

        result.map_err(PortError::from)
    }

    async fn try_mark_refunded(&self, payment_ref: &PaymentRef) -> Result<bool, PortError> {
        let result = sqlx::query(
            r#"
            INSERT INTO lead_refunds (payment_ref, refunded_at)
            VALUES ($1, $2)
            ON CONFLICT (payment_ref) DO NOTHING
            "#,
        )
        .bind(payment_ref.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::from(DatabaseError::from(&e)))?;

        Ok(result.rows_affected() == 1)
    }

    async fn clear_refund_mark(&self, payment_ref: &PaymentRef) -> Result<(), PortError> {
        sqlx::query("DELETE FROM lead_refunds WHERE payment_ref = $1")
            .bind(payment_ref.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::from(DatabaseError::from(&e)))?;

        Ok(())
    }
}

fn parse_status(value: &str) -> Result<JobStatus, DatabaseError> {
    JobStatus::parse(value)
        .ok_or_else(|| DatabaseError::CorruptRow(format!("unknown job status '{value}'")))
}

fn job_from_row(row: &PgRow) -> Result<Job, DatabaseError> {
    let status: String = row.try_get("status")?;
    Ok(Job {
        id: JobId::from_uuid(row.try_get::<Uuid, _>("id")?),
        owner_id: HomeownerId::from_uuid(row.try_get::<Uuid, _>("owner_id")?),
        category: row.try_get("category")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        status: parse_status(&status)?,
        claim_cap: row.try_get::<i32, _>("claim_cap")? as u32,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn summary_from_row(row: &PgRow) -> Result<JobSummary, DatabaseError> {
    let status: String = row.try_get("status")?;
    Ok(JobSummary {
        id: JobId::from_uuid(row.try_get::<Uuid, _>("id")?),
        category: row.try_get("category")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        status: parse_status(&status)?,
        claim_count: row.try_get::<i64, _>("claim_count")? as u32,
        claim_cap: row.try_get::<i32, _>("claim_cap")? as u32,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn claim_from_row(row: &PgRow) -> Result<Claim, DatabaseError> {
    Ok(Claim {
        id: core_kernel::ClaimId::from_uuid(row.try_get::<Uuid, _>("id")?),
        job_id: JobId::from_uuid(row.try_get::<Uuid, _>("job_id")?),
        pro_id: ProId::from_uuid(row.try_get::<Uuid, _>("pro_id")?),
        payment_ref: PaymentRef::from(row.try_get::<String, _>("payment_ref")?),
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}
