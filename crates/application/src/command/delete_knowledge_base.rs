//! Delete a knowledge base and all of its documents.

use std::sync::Arc;

use common::KnowledgeBaseId;
use domain::{DomainError, KnowledgeBaseRepository, KnowledgeService, UnitOfWork};
use event_bus::EventBus;

use super::{parse_id, publish_events};

/// Command payload.
#[derive(Debug, Clone)]
pub struct DeleteKnowledgeBase {
    pub id: String,
}

/// Removes the aggregate row and its document set in one transaction, then
/// publishes `knowledge_base.deleted`.
pub struct DeleteKnowledgeBaseHandler<U> {
    uow: Arc<U>,
    kb_repo: Arc<dyn KnowledgeBaseRepository>,
    service: Arc<KnowledgeService>,
    event_bus: Arc<dyn EventBus>,
}

impl<U: UnitOfWork> DeleteKnowledgeBaseHandler<U> {
    pub fn new(
        uow: Arc<U>,
        kb_repo: Arc<dyn KnowledgeBaseRepository>,
        service: Arc<KnowledgeService>,
        event_bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            uow,
            kb_repo,
            service,
            event_bus,
        }
    }

    #[tracing::instrument(skip(self, cmd), fields(knowledge_base_id = %cmd.id))]
    pub async fn handle(&self, cmd: DeleteKnowledgeBase) -> Result<(), DomainError> {
        let id: KnowledgeBaseId = parse_id(&cmd.id)?;
        let kb_repo = Arc::clone(&self.kb_repo);
        let service = Arc::clone(&self.service);

        let mut kb = self
            .uow
            .run_in_transaction(move |scope| {
                Box::pin(async move {
                    let mut kb = kb_repo
                        .find_by_id(scope, id)
                        .await?
                        .ok_or(DomainError::KnowledgeBaseNotFound(id))?;
                    kb.mark_deleted();
                    service.delete_knowledge_base(scope, &kb).await?;
                    Ok(kb)
                })
            })
            .await?;

        publish_events(self.event_bus.as_ref(), &mut kb).await;
        Ok(())
    }
}
