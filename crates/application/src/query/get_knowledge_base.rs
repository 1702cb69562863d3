//! Fetch a single knowledge base.

use std::sync::Arc;

use common::KnowledgeBaseId;
use domain::{DomainError, KnowledgeBaseRepository, TxScope};

use crate::command::parse_id;
use crate::dto::KnowledgeBaseDto;

pub struct GetKnowledgeBase {
    kb_repo: Arc<dyn KnowledgeBaseRepository>,
}

impl GetKnowledgeBase {
    pub fn new(kb_repo: Arc<dyn KnowledgeBaseRepository>) -> Self {
        Self { kb_repo }
    }

    pub async fn handle(
        &self,
        id: &str,
        include_documents: bool,
    ) -> Result<KnowledgeBaseDto, DomainError> {
        let id: KnowledgeBaseId = parse_id(id)?;
        let mut scope = TxScope::ambient();
        let kb = self
            .kb_repo
            .find_by_id(&mut scope, id)
            .await?
            .ok_or(DomainError::KnowledgeBaseNotFound(id))?;
        Ok(KnowledgeBaseDto::from_aggregate(&kb, include_documents))
    }
}
