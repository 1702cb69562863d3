//! List and search documents.

use std::sync::Arc;

use common::KnowledgeBaseId;
use domain::{DocumentRepository, DomainError, KnowledgeBaseRepository, TxScope};

use crate::command::parse_id;
use crate::dto::DocumentDto;

/// Lists the documents owned by one knowledge base.
pub struct ListDocuments {
    kb_repo: Arc<dyn KnowledgeBaseRepository>,
    doc_repo: Arc<dyn DocumentRepository>,
}

impl ListDocuments {
    pub fn new(
        kb_repo: Arc<dyn KnowledgeBaseRepository>,
        doc_repo: Arc<dyn DocumentRepository>,
    ) -> Self {
        Self { kb_repo, doc_repo }
    }

    pub async fn handle(&self, knowledge_base_id: &str) -> Result<Vec<DocumentDto>, DomainError> {
        let kb_id: KnowledgeBaseId = parse_id(knowledge_base_id)?;
        let mut scope = TxScope::ambient();

        if self.kb_repo.find_by_id(&mut scope, kb_id).await?.is_none() {
            return Err(DomainError::KnowledgeBaseNotFound(kb_id));
        }

        let documents = self.doc_repo.find_by_knowledge_base(&mut scope, kb_id).await?;
        Ok(documents.iter().map(DocumentDto::from_entity).collect())
    }
}

/// Finds documents carrying at least one of the given tags, across all
/// knowledge bases.
pub struct SearchDocumentsByTags {
    doc_repo: Arc<dyn DocumentRepository>,
}

impl SearchDocumentsByTags {
    pub fn new(doc_repo: Arc<dyn DocumentRepository>) -> Self {
        Self { doc_repo }
    }

    pub async fn handle(&self, tags: &[String]) -> Result<Vec<DocumentDto>, DomainError> {
        let mut scope = TxScope::ambient();
        let documents = self.doc_repo.search_by_tags(&mut scope, tags).await?;
        Ok(documents.iter().map(DocumentDto::from_entity).collect())
    }
}
