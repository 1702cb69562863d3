//! Domain layer for the knowledge-base backend.
//!
//! This crate holds everything the rest of the system orbits around:
//! - The `KnowledgeBase` aggregate root and its owned `Document` entities
//! - Domain events collected by the aggregate and drained after commit
//! - The error taxonomy with its stable transport-facing classification
//! - Repository and unit-of-work contracts implemented by the persistence layer
//! - The `KnowledgeService` for cross-aggregate rules (name uniqueness, cascade delete)

pub mod document;
pub mod error;
pub mod event;
pub mod knowledge_base;
pub mod repository;
pub mod service;

pub use document::Document;
pub use error::{DomainError, ErrorKind};
pub use event::{DomainEvent, EventPayload};
pub use knowledge_base::KnowledgeBase;
pub use repository::{
    DocumentRepository, KnowledgeBaseRepository, TxFuture, TxScope, UnitOfWork,
};
pub use service::KnowledgeService;
