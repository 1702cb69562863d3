//! Domain service for cross-aggregate rules.

use std::sync::Arc;

use crate::error::DomainError;
use crate::knowledge_base::KnowledgeBase;
use crate::repository::{DocumentRepository, KnowledgeBaseRepository, TxScope};

/// Handles business logic that spans aggregates or does not belong on the
/// aggregate itself: the create-time name-uniqueness rule and cascade
/// deletion.
#[derive(Clone)]
pub struct KnowledgeService {
    kb_repo: Arc<dyn KnowledgeBaseRepository>,
    doc_repo: Arc<dyn DocumentRepository>,
}

impl KnowledgeService {
    pub fn new(
        kb_repo: Arc<dyn KnowledgeBaseRepository>,
        doc_repo: Arc<dyn DocumentRepository>,
    ) -> Self {
        Self { kb_repo, doc_repo }
    }

    /// Creates and persists a knowledge base after checking that the name is
    /// not already taken.
    #[tracing::instrument(skip(self, scope, description))]
    pub async fn create_knowledge_base(
        &self,
        scope: &mut TxScope,
        name: String,
        description: String,
    ) -> Result<KnowledgeBase, DomainError> {
        if self.kb_repo.exists_by_name(scope, &name).await? {
            return Err(DomainError::NameTaken(name));
        }

        let kb = KnowledgeBase::create(name, description)?;
        self.kb_repo.save(scope, &kb).await?;
        Ok(kb)
    }

    /// Deletes a knowledge base together with all of its documents.
    #[tracing::instrument(skip(self, scope, kb), fields(knowledge_base_id = %kb.id()))]
    pub async fn delete_knowledge_base(
        &self,
        scope: &mut TxScope,
        kb: &KnowledgeBase,
    ) -> Result<(), DomainError> {
        self.doc_repo.delete_by_knowledge_base(scope, kb.id()).await?;
        self.kb_repo.delete(scope, kb.id()).await
    }
}
