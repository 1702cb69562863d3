//! Lifecycle handlers subscribed by event name.

use async_trait::async_trait;
use domain::{DomainEvent, EventPayload};
use event_bus::{DeliveryError, EventHandler};

/// Reacts to newly created knowledge bases.
#[derive(Default)]
pub struct KnowledgeBaseCreatedHandler;

impl KnowledgeBaseCreatedHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventHandler for KnowledgeBaseCreatedHandler {
    fn name(&self) -> &'static str {
        "knowledge-base-created"
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), DeliveryError> {
        let EventPayload::KnowledgeBaseCreated { name, .. } = event.payload() else {
            return Ok(());
        };
        tracing::info!(
            knowledge_base_id = %event.aggregate_id(),
            name,
            "knowledge base created"
        );
        Ok(())
    }
}

/// Reacts to documents added to a knowledge base.
#[derive(Default)]
pub struct DocumentAddedHandler;

impl DocumentAddedHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventHandler for DocumentAddedHandler {
    fn name(&self) -> &'static str {
        "document-added"
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), DeliveryError> {
        let EventPayload::DocumentAdded {
            document_id, title, ..
        } = event.payload()
        else {
            return Ok(());
        };
        tracing::info!(
            knowledge_base_id = %event.aggregate_id(),
            document_id = %document_id,
            title,
            "document added"
        );
        Ok(())
    }
}
