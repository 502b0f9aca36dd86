//! Lead Store Infrastructure
//!
//! Adapters implementing [`domain_leads::LeadStore`]:
//!
//! - [`InMemoryLeadStore`] — per-job async mutexes; used by the test suite
//!   and local development. Finalization for one job is a single critical
//!   section; different jobs never contend.
//! - [`PostgresLeadStore`] — SQLx repository. The same critical section is a
//!   `SELECT ... FOR UPDATE` transaction, with unique indexes on
//!   `(job_id, pro_id)` and `payment_ref` as the durable backstop, so the
//!   cap invariant holds across independent processes sharing the database.
//!
//! Migrations live in `migrations/`.

pub mod pool;
pub mod error;
pub mod memory;
pub mod postgres;

pub use pool::{create_pool, DatabaseConfig, DatabasePool};
pub use error::DatabaseError;
pub use memory::InMemoryLeadStore;
pub use postgres::PostgresLeadStore;
