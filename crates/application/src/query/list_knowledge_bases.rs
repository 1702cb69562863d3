//! List all knowledge bases.

use std::sync::Arc;

use domain::{DomainError, KnowledgeBaseRepository, TxScope};

use crate::dto::KnowledgeBaseDto;

pub struct ListKnowledgeBases {
    kb_repo: Arc<dyn KnowledgeBaseRepository>,
}

impl ListKnowledgeBases {
    pub fn new(kb_repo: Arc<dyn KnowledgeBaseRepository>) -> Self {
        Self { kb_repo }
    }

    pub async fn handle(&self) -> Result<Vec<KnowledgeBaseDto>, DomainError> {
        let mut scope = TxScope::ambient();
        let bases = self.kb_repo.find_all(&mut scope).await?;
        Ok(bases
            .iter()
            .map(|kb| KnowledgeBaseDto::from_aggregate(kb, false))
            .collect())
    }
}
