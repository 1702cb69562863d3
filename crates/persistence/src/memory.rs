//! In-memory persistence backend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{DocumentId, KnowledgeBaseId};
use domain::{
    Document, DomainError, KnowledgeBase, KnowledgeBaseRepository, DocumentRepository, TxFuture,
    TxScope, UnitOfWork,
};
use tokio::sync::RwLock;

/// Marshalled knowledge-base row, without documents or events.
#[derive(Debug, Clone)]
struct KnowledgeBaseRecord {
    id: KnowledgeBaseId,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl KnowledgeBaseRecord {
    fn from_aggregate(kb: &KnowledgeBase) -> Self {
        Self {
            id: kb.id(),
            name: kb.name().to_owned(),
            description: kb.description().to_owned(),
            created_at: kb.created_at(),
            updated_at: kb.updated_at(),
        }
    }
}

/// Shared backing store for the in-memory repositories.
///
/// Both repositories hang off one store so an aggregate loaded by id comes
/// back with its documents, mirroring what the relational backend does with
/// two tables.
#[derive(Default)]
pub struct MemoryStore {
    knowledge_bases: RwLock<HashMap<KnowledgeBaseId, KnowledgeBaseRecord>>,
    documents: RwLock<HashMap<DocumentId, Document>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn documents_of(&self, kb_id: KnowledgeBaseId) -> Vec<Document> {
        let documents = self.documents.read().await;
        let mut owned: Vec<Document> = documents
            .values()
            .filter(|d| d.knowledge_base_id() == kb_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().as_uuid().cmp(&b.id().as_uuid()))
        });
        owned
    }
}

/// In-memory knowledge-base repository.
#[derive(Clone)]
pub struct MemoryKnowledgeBaseRepository {
    store: Arc<MemoryStore>,
}

impl MemoryKnowledgeBaseRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl KnowledgeBaseRepository for MemoryKnowledgeBaseRepository {
    async fn save(&self, _scope: &mut TxScope, kb: &KnowledgeBase) -> Result<(), DomainError> {
        self.store
            .knowledge_bases
            .write()
            .await
            .insert(kb.id(), KnowledgeBaseRecord::from_aggregate(kb));
        Ok(())
    }

    async fn find_by_id(
        &self,
        _scope: &mut TxScope,
        id: KnowledgeBaseId,
    ) -> Result<Option<KnowledgeBase>, DomainError> {
        let record = {
            let knowledge_bases = self.store.knowledge_bases.read().await;
            knowledge_bases.get(&id).cloned()
        };
        let Some(record) = record else {
            return Ok(None);
        };

        let documents = self.store.documents_of(id).await;
        Ok(Some(KnowledgeBase::reconstruct(
            record.id,
            record.name,
            record.description,
            documents,
            record.created_at,
            record.updated_at,
        )))
    }

    async fn find_all(&self, _scope: &mut TxScope) -> Result<Vec<KnowledgeBase>, DomainError> {
        let records: Vec<KnowledgeBaseRecord> = {
            let knowledge_bases = self.store.knowledge_bases.read().await;
            knowledge_bases.values().cloned().collect()
        };

        let mut result = Vec::with_capacity(records.len());
        for record in records {
            let documents = self.store.documents_of(record.id).await;
            result.push(KnowledgeBase::reconstruct(
                record.id,
                record.name,
                record.description,
                documents,
                record.created_at,
                record.updated_at,
            ));
        }
        result.sort_by_key(|kb| kb.created_at());
        Ok(result)
    }

    async fn delete(&self, _scope: &mut TxScope, id: KnowledgeBaseId) -> Result<(), DomainError> {
        self.store.knowledge_bases.write().await.remove(&id);
        Ok(())
    }

    async fn exists_by_name(
        &self,
        _scope: &mut TxScope,
        name: &str,
    ) -> Result<bool, DomainError> {
        let knowledge_bases = self.store.knowledge_bases.read().await;
        Ok(knowledge_bases.values().any(|record| record.name == name))
    }
}

/// In-memory document repository.
#[derive(Clone)]
pub struct MemoryDocumentRepository {
    store: Arc<MemoryStore>,
}

impl MemoryDocumentRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DocumentRepository for MemoryDocumentRepository {
    async fn save(&self, _scope: &mut TxScope, doc: &Document) -> Result<(), DomainError> {
        self.store
            .documents
            .write()
            .await
            .insert(doc.id(), doc.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        _scope: &mut TxScope,
        id: DocumentId,
    ) -> Result<Option<Document>, DomainError> {
        Ok(self.store.documents.read().await.get(&id).cloned())
    }

    async fn find_by_knowledge_base(
        &self,
        _scope: &mut TxScope,
        kb_id: KnowledgeBaseId,
    ) -> Result<Vec<Document>, DomainError> {
        Ok(self.store.documents_of(kb_id).await)
    }

    async fn delete(&self, _scope: &mut TxScope, id: DocumentId) -> Result<(), DomainError> {
        self.store.documents.write().await.remove(&id);
        Ok(())
    }

    async fn delete_by_knowledge_base(
        &self,
        _scope: &mut TxScope,
        kb_id: KnowledgeBaseId,
    ) -> Result<(), DomainError> {
        self.store
            .documents
            .write()
            .await
            .retain(|_, doc| doc.knowledge_base_id() != kb_id);
        Ok(())
    }

    async fn search_by_tags(
        &self,
        _scope: &mut TxScope,
        tags: &[String],
    ) -> Result<Vec<Document>, DomainError> {
        let documents = self.store.documents.read().await;
        let mut hits: Vec<Document> = documents
            .values()
            .filter(|doc| doc.tags().iter().any(|t| tags.contains(t)))
            .cloned()
            .collect();
        hits.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().as_uuid().cmp(&b.id().as_uuid()))
        });
        Ok(hits)
    }
}

/// No-op passthrough unit of work for the in-memory backend.
///
/// Carries no atomicity guarantee: the closure runs once against the
/// ambient (non-transactional) scope and partial effects of a failed
/// closure are NOT undone. A non-transactional substitute for environments
/// with no durable shared state contention; anything that needs real
/// rollback uses [`PgUnitOfWork`](crate::PgUnitOfWork).
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryUnitOfWork;

impl MemoryUnitOfWork {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn run_in_transaction<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        T: Send + 'static,
        F: for<'s> FnOnce(&'s mut TxScope) -> TxFuture<'s, T> + Send + 'static,
    {
        let mut scope = TxScope::ambient();
        work(&mut scope).await
    }
}
