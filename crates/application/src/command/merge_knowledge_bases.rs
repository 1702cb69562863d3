//! Merge one knowledge base into another.

use std::sync::Arc;

use common::KnowledgeBaseId;
use domain::{DocumentRepository, DomainError, KnowledgeBaseRepository, UnitOfWork};

use crate::dto::MergeResultDto;

use super::parse_id;

/// Command payload.
#[derive(Debug, Clone)]
pub struct MergeKnowledgeBases {
    /// Knowledge base to drain and delete.
    pub source_id: String,
    /// Knowledge base that receives the documents.
    pub target_id: String,
}

/// Outcome captured inside the transaction; the DTO is assembled only after
/// commit.
struct MergeOutcome {
    source_name: String,
    target_name: String,
    documents_moved: usize,
}

/// Moves every document of the source under the target and deletes the
/// source, all inside one transaction.
///
/// Document identity is not preserved: documents are recreated under the
/// target with fresh ids. Any failure rolls the whole migration back,
/// leaving both aggregates exactly as they were.
pub struct MergeKnowledgeBasesHandler<U> {
    uow: Arc<U>,
    kb_repo: Arc<dyn KnowledgeBaseRepository>,
    doc_repo: Arc<dyn DocumentRepository>,
}

impl<U: UnitOfWork> MergeKnowledgeBasesHandler<U> {
    pub fn new(
        uow: Arc<U>,
        kb_repo: Arc<dyn KnowledgeBaseRepository>,
        doc_repo: Arc<dyn DocumentRepository>,
    ) -> Self {
        Self {
            uow,
            kb_repo,
            doc_repo,
        }
    }

    #[tracing::instrument(
        skip(self, cmd),
        fields(source_id = %cmd.source_id, target_id = %cmd.target_id)
    )]
    pub async fn handle(&self, cmd: MergeKnowledgeBases) -> Result<MergeResultDto, DomainError> {
        let source_id: KnowledgeBaseId = parse_id(&cmd.source_id)?;
        let target_id: KnowledgeBaseId = parse_id(&cmd.target_id)?;

        // Rejected before any repository call.
        if source_id == target_id {
            return Err(DomainError::MergeSelf);
        }

        let kb_repo = Arc::clone(&self.kb_repo);
        let doc_repo = Arc::clone(&self.doc_repo);

        let outcome = self
            .uow
            .run_in_transaction(move |scope| {
                Box::pin(async move {
                    let source = kb_repo
                        .find_by_id(scope, source_id)
                        .await?
                        .ok_or(DomainError::KnowledgeBaseNotFound(source_id))?;
                    let mut target = kb_repo
                        .find_by_id(scope, target_id)
                        .await?
                        .ok_or(DomainError::KnowledgeBaseNotFound(target_id))?;

                    let source_docs = doc_repo.find_by_knowledge_base(scope, source_id).await?;

                    let mut documents_moved = 0;
                    for doc in &source_docs {
                        let new_doc = target.add_document(
                            doc.title().to_owned(),
                            doc.content().to_owned(),
                            doc.tags().to_vec(),
                        )?;
                        doc_repo.save(scope, new_doc).await?;
                        doc_repo.delete(scope, doc.id()).await?;
                        documents_moved += 1;
                    }

                    kb_repo.save(scope, &target).await?;
                    doc_repo.delete_by_knowledge_base(scope, source_id).await?;
                    kb_repo.delete(scope, source_id).await?;

                    Ok(MergeOutcome {
                        source_name: source.name().to_owned(),
                        target_name: target.name().to_owned(),
                        documents_moved,
                    })
                })
            })
            .await?;

        tracing::info!(
            source_id = %source_id,
            target_id = %target_id,
            documents_moved = outcome.documents_moved,
            "knowledge bases merged"
        );

        Ok(MergeResultDto {
            source_id: source_id.to_string(),
            source_name: outcome.source_name,
            target_id: target_id.to_string(),
            target_name: outcome.target_name,
            documents_moved: outcome.documents_moved,
            source_deleted: true,
        })
    }
}
