//! Shared identifier types used across the knowledge-base backend.

pub mod types;

pub use types::{DocumentId, EventId, KnowledgeBaseId};
