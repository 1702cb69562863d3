//! Command handlers.
//!
//! Each handler parses identifiers up front (malformed input fails before
//! storage is touched), runs lookup + mutation + saves inside the unit of
//! work, and only after a successful commit pulls the buffered events from
//! the retained aggregate and hands them to the event bus.

mod add_document;
mod create_knowledge_base;
mod delete_knowledge_base;
mod merge_knowledge_bases;
mod remove_document;
mod update_knowledge_base;

pub use add_document::{AddDocument, AddDocumentHandler};
pub use create_knowledge_base::{CreateKnowledgeBase, CreateKnowledgeBaseHandler};
pub use delete_knowledge_base::{DeleteKnowledgeBase, DeleteKnowledgeBaseHandler};
pub use merge_knowledge_bases::{MergeKnowledgeBases, MergeKnowledgeBasesHandler};
pub use remove_document::{RemoveDocument, RemoveDocumentHandler};
pub use update_knowledge_base::{UpdateKnowledgeBase, UpdateKnowledgeBaseHandler};

use std::str::FromStr;

use domain::{DomainError, KnowledgeBase};
use event_bus::EventBus;

/// Parses an id string, mapping failure into the validation taxonomy.
pub(crate) fn parse_id<T: FromStr>(raw: &str) -> Result<T, DomainError> {
    raw.parse::<T>()
        .map_err(|_| DomainError::InvalidId(raw.to_owned()))
}

/// Drains the aggregate's buffered events and publishes them.
///
/// Called only after the transaction has committed. A delivery failure is
/// reported but never surfaces: the state change is already durable, and
/// durability takes precedence over guaranteed notification.
pub(crate) async fn publish_events(bus: &dyn EventBus, kb: &mut KnowledgeBase) {
    let events = kb.pull_events();
    if events.is_empty() {
        return;
    }
    if let Err(err) = bus.publish_all(events).await {
        tracing::warn!(
            knowledge_base_id = %kb.id(),
            error = %err,
            "failed to publish domain events"
        );
    }
}
