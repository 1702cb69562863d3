//! Persistence backends for the knowledge-base backend.
//!
//! Two interchangeable implementations of the domain's repository and
//! unit-of-work contracts:
//!
//! - [`memory`] — `HashMap`-backed stores behind async locks, with a no-op
//!   passthrough unit of work. For tests, demos, and single-process use
//!   without durable shared state.
//! - [`postgres`] — `sqlx`-backed stores whose every call honors the
//!   transaction handle threaded through `TxScope`, plus the real
//!   transactional unit of work.

pub mod memory;
pub mod postgres;

pub use memory::{MemoryDocumentRepository, MemoryKnowledgeBaseRepository, MemoryStore, MemoryUnitOfWork};
pub use postgres::{
    PgDocumentRepository, PgKnowledgeBaseRepository, PgTransaction, PgUnitOfWork, run_migrations,
};
