//! Search-index maintenance driven by document lifecycle events.

use async_trait::async_trait;
use domain::{DomainEvent, EventPayload};
use event_bus::{DeliveryError, EventHandler};

/// Keeps the (here: imaginary) full-text index in step with document
/// changes. Subscribed to all events; ignores the ones it does not care
/// about.
#[derive(Default)]
pub struct SearchIndexHandler;

impl SearchIndexHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventHandler for SearchIndexHandler {
    fn name(&self) -> &'static str {
        "search-index"
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), DeliveryError> {
        match event.payload() {
            EventPayload::DocumentAdded {
                document_id, title, ..
            } => {
                tracing::info!(
                    document_id = %document_id,
                    title,
                    "indexing new document"
                );
            }
            EventPayload::DocumentUpdated {
                document_id,
                new_title,
                ..
            } => {
                tracing::info!(
                    document_id = %document_id,
                    title = new_title,
                    "reindexing document"
                );
            }
            EventPayload::DocumentRemoved { document_id, .. } => {
                tracing::info!(document_id = %document_id, "removing document from index");
            }
            EventPayload::KnowledgeBaseDeleted { .. } => {
                tracing::info!(
                    knowledge_base_id = %event.aggregate_id(),
                    "dropping all documents of deleted knowledge base from index"
                );
            }
            _ => {}
        }
        Ok(())
    }
}
