//! Update a knowledge base's name and description.

use std::sync::Arc;

use common::KnowledgeBaseId;
use domain::{DomainError, KnowledgeBaseRepository, UnitOfWork};
use event_bus::EventBus;

use crate::dto::KnowledgeBaseDto;

use super::{parse_id, publish_events};

/// Command payload.
#[derive(Debug, Clone)]
pub struct UpdateKnowledgeBase {
    pub id: String,
    pub name: String,
    pub description: String,
}

pub struct UpdateKnowledgeBaseHandler<U> {
    uow: Arc<U>,
    kb_repo: Arc<dyn KnowledgeBaseRepository>,
    event_bus: Arc<dyn EventBus>,
}

impl<U: UnitOfWork> UpdateKnowledgeBaseHandler<U> {
    pub fn new(
        uow: Arc<U>,
        kb_repo: Arc<dyn KnowledgeBaseRepository>,
        event_bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            uow,
            kb_repo,
            event_bus,
        }
    }

    #[tracing::instrument(skip(self, cmd), fields(knowledge_base_id = %cmd.id))]
    pub async fn handle(&self, cmd: UpdateKnowledgeBase) -> Result<KnowledgeBaseDto, DomainError> {
        let id: KnowledgeBaseId = parse_id(&cmd.id)?;
        let kb_repo = Arc::clone(&self.kb_repo);
        let UpdateKnowledgeBase {
            name, description, ..
        } = cmd;

        let mut kb = self
            .uow
            .run_in_transaction(move |scope| {
                Box::pin(async move {
                    let mut kb = kb_repo
                        .find_by_id(scope, id)
                        .await?
                        .ok_or(DomainError::KnowledgeBaseNotFound(id))?;
                    kb.update_info(name, description)?;
                    kb_repo.save(scope, &kb).await?;
                    Ok(kb)
                })
            })
            .await?;

        publish_events(self.event_bus.as_ref(), &mut kb).await;
        Ok(KnowledgeBaseDto::from_aggregate(&kb, false))
    }
}
