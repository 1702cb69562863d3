//! Remove a document from a knowledge base.

use std::sync::Arc;

use common::{DocumentId, KnowledgeBaseId};
use domain::{DocumentRepository, DomainError, KnowledgeBaseRepository, UnitOfWork};
use event_bus::EventBus;

use super::{parse_id, publish_events};

/// Command payload.
#[derive(Debug, Clone)]
pub struct RemoveDocument {
    pub knowledge_base_id: String,
    pub document_id: String,
}

pub struct RemoveDocumentHandler<U> {
    uow: Arc<U>,
    kb_repo: Arc<dyn KnowledgeBaseRepository>,
    doc_repo: Arc<dyn DocumentRepository>,
    event_bus: Arc<dyn EventBus>,
}

impl<U: UnitOfWork> RemoveDocumentHandler<U> {
    pub fn new(
        uow: Arc<U>,
        kb_repo: Arc<dyn KnowledgeBaseRepository>,
        doc_repo: Arc<dyn DocumentRepository>,
        event_bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            uow,
            kb_repo,
            doc_repo,
            event_bus,
        }
    }

    #[tracing::instrument(
        skip(self, cmd),
        fields(knowledge_base_id = %cmd.knowledge_base_id, document_id = %cmd.document_id)
    )]
    pub async fn handle(&self, cmd: RemoveDocument) -> Result<(), DomainError> {
        let kb_id: KnowledgeBaseId = parse_id(&cmd.knowledge_base_id)?;
        let doc_id: DocumentId = parse_id(&cmd.document_id)?;
        let kb_repo = Arc::clone(&self.kb_repo);
        let doc_repo = Arc::clone(&self.doc_repo);

        let mut kb = self
            .uow
            .run_in_transaction(move |scope| {
                Box::pin(async move {
                    let mut kb = kb_repo
                        .find_by_id(scope, kb_id)
                        .await?
                        .ok_or(DomainError::KnowledgeBaseNotFound(kb_id))?;

                    kb.remove_document(doc_id)?;
                    doc_repo.delete(scope, doc_id).await?;
                    kb_repo.save(scope, &kb).await?;
                    Ok(kb)
                })
            })
            .await?;

        publish_events(self.event_bus.as_ref(), &mut kb).await;
        Ok(())
    }
}
