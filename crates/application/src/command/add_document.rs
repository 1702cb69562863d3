//! Add a document to a knowledge base.

use std::sync::Arc;

use common::KnowledgeBaseId;
use domain::{DocumentRepository, DomainError, KnowledgeBaseRepository, UnitOfWork};
use event_bus::EventBus;

use crate::dto::DocumentDto;

use super::{parse_id, publish_events};

/// Command payload.
#[derive(Debug, Clone)]
pub struct AddDocument {
    pub knowledge_base_id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

pub struct AddDocumentHandler<U> {
    uow: Arc<U>,
    kb_repo: Arc<dyn KnowledgeBaseRepository>,
    doc_repo: Arc<dyn DocumentRepository>,
    event_bus: Arc<dyn EventBus>,
}

impl<U: UnitOfWork> AddDocumentHandler<U> {
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
        fields(knowledge_base_id = %cmd.knowledge_base_id, title = %cmd.title)
    )]
    pub async fn handle(&self, cmd: AddDocument) -> Result<DocumentDto, DomainError> {
        let kb_id: KnowledgeBaseId = parse_id(&cmd.knowledge_base_id)?;
        let kb_repo = Arc::clone(&self.kb_repo);
        let doc_repo = Arc::clone(&self.doc_repo);
        let AddDocument {
            title,
            content,
            tags,
            ..
        } = cmd;

        let (mut kb, dto) = self
            .uow
            .run_in_transaction(move |scope| {
                Box::pin(async move {
                    let mut kb = kb_repo
                        .find_by_id(scope, kb_id)
                        .await?
                        .ok_or(DomainError::KnowledgeBaseNotFound(kb_id))?;

                    let doc = kb.add_document(title, content, tags)?;
                    doc_repo.save(scope, doc).await?;
                    let dto = DocumentDto::from_entity(doc);

                    kb_repo.save(scope, &kb).await?;
                    Ok((kb, dto))
                })
            })
            .await?;

        publish_events(self.event_bus.as_ref(), &mut kb).await;
        Ok(dto)
    }
}
