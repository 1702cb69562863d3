//! Create a knowledge base.

use std::sync::Arc;

use domain::{DomainError, KnowledgeService, UnitOfWork};
use event_bus::EventBus;

use crate::dto::KnowledgeBaseDto;

use super::publish_events;

/// Command payload.
#[derive(Debug, Clone)]
pub struct CreateKnowledgeBase {
    pub name: String,
    pub description: String,
}

/// Creates a knowledge base after the cross-aggregate uniqueness check,
/// then publishes the buffered `knowledge_base.created` event.
pub struct CreateKnowledgeBaseHandler<U> {
    uow: Arc<U>,
    service: Arc<KnowledgeService>,
    event_bus: Arc<dyn EventBus>,
}

impl<U: UnitOfWork> CreateKnowledgeBaseHandler<U> {
    pub fn new(
        uow: Arc<U>,
        service: Arc<KnowledgeService>,
        event_bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            uow,
            service,
            event_bus,
        }
    }

    #[tracing::instrument(skip(self, cmd), fields(name = %cmd.name))]
    pub async fn handle(&self, cmd: CreateKnowledgeBase) -> Result<KnowledgeBaseDto, DomainError> {
        let service = Arc::clone(&self.service);
        let CreateKnowledgeBase { name, description } = cmd;

        let mut kb = self
            .uow
            .run_in_transaction(move |scope| {
                Box::pin(async move {
                    service.create_knowledge_base(scope, name, description).await
                })
            })
            .await?;

        publish_events(self.event_bus.as_ref(), &mut kb).await;
        Ok(KnowledgeBaseDto::from_aggregate(&kb, false))
    }
}
