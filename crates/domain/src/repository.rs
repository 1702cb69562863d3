//! Persistence contracts consumed by the domain and application layers.
//!
//! Repositories are implemented by the `persistence` crate; the domain only
//! defines the narrow interfaces it needs. Every call threads an explicit
//! [`TxScope`] so repositories use the active transaction when one is open
//! and the ambient connection otherwise — there is no hidden transaction
//! state.

use std::any::Any;

use async_trait::async_trait;
use common::{DocumentId, KnowledgeBaseId};
use futures_util::future::BoxFuture;

use crate::document::Document;
use crate::error::DomainError;
use crate::knowledge_base::KnowledgeBase;

/// Explicit scope threaded through repository calls.
///
/// Carries the backend-specific transaction handle, if any. The handle is
/// type-erased so the domain stays independent of the storage engine; each
/// backend downcasts to its own transaction type and ignores anything else.
pub struct TxScope {
    tx: Option<Box<dyn Any + Send>>,
}

impl TxScope {
    /// A scope with no open transaction: repositories use the ambient
    /// connection.
    pub fn ambient() -> Self {
        Self { tx: None }
    }

    /// A scope carrying an open transaction handle.
    pub fn with_transaction<T: Any + Send>(tx: T) -> Self {
        Self {
            tx: Some(Box::new(tx)),
        }
    }

    /// Whether a transaction is open on this scope.
    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    /// Borrows the transaction handle if one of the expected type is open.
    pub fn transaction_mut<T: Any + Send>(&mut self) -> Option<&mut T> {
        self.tx.as_mut()?.downcast_mut::<T>()
    }

    /// Removes and returns the transaction handle for commit or rollback.
    ///
    /// Leaves the scope untouched when the open handle is of a different
    /// type.
    pub fn take_transaction<T: Any + Send>(&mut self) -> Option<T> {
        let boxed = self.tx.take()?;
        match boxed.downcast::<T>() {
            Ok(tx) => Some(*tx),
            Err(other) => {
                self.tx = Some(other);
                None
            }
        }
    }
}

impl Default for TxScope {
    fn default() -> Self {
        Self::ambient()
    }
}

/// Future returned by a unit-of-work closure, borrowing the scope it runs in.
pub type TxFuture<'s, T> = BoxFuture<'s, Result<T, DomainError>>;

/// Atomic boundary around a set of repository operations.
///
/// If the closure returns `Ok`, everything performed through the scope's
/// repositories commits before `run_in_transaction` returns. If it returns
/// `Err`, everything rolls back and the error is returned unmodified; no
/// partial state is visible to subsequent readers.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    async fn run_in_transaction<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        T: Send + 'static,
        F: for<'s> FnOnce(&'s mut TxScope) -> TxFuture<'s, T> + Send + 'static;
}

/// Store for knowledge-base aggregates.
///
/// Absence is `Ok(None)`, distinct from a lookup failure.
#[async_trait]
pub trait KnowledgeBaseRepository: Send + Sync {
    /// Saves (creates or updates) a knowledge base.
    async fn save(&self, scope: &mut TxScope, kb: &KnowledgeBase) -> Result<(), DomainError>;

    /// Looks a knowledge base up by id, with its documents.
    async fn find_by_id(
        &self,
        scope: &mut TxScope,
        id: KnowledgeBaseId,
    ) -> Result<Option<KnowledgeBase>, DomainError>;

    /// Returns all knowledge bases.
    async fn find_all(&self, scope: &mut TxScope) -> Result<Vec<KnowledgeBase>, DomainError>;

    /// Deletes a knowledge base row.
    async fn delete(&self, scope: &mut TxScope, id: KnowledgeBaseId) -> Result<(), DomainError>;

    /// Existence check used by the create-time uniqueness rule.
    async fn exists_by_name(&self, scope: &mut TxScope, name: &str) -> Result<bool, DomainError>;
}

/// Store for document rows.
///
/// Documents belong to the knowledge-base aggregate; this store exists for
/// row-level persistence and for read-side queries.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Saves (creates or updates) a document.
    async fn save(&self, scope: &mut TxScope, doc: &Document) -> Result<(), DomainError>;

    /// Looks a document up by id.
    async fn find_by_id(
        &self,
        scope: &mut TxScope,
        id: DocumentId,
    ) -> Result<Option<Document>, DomainError>;

    /// Returns all documents owned by a knowledge base.
    async fn find_by_knowledge_base(
        &self,
        scope: &mut TxScope,
        kb_id: KnowledgeBaseId,
    ) -> Result<Vec<Document>, DomainError>;

    /// Deletes a document row.
    async fn delete(&self, scope: &mut TxScope, id: DocumentId) -> Result<(), DomainError>;

    /// Deletes every document owned by a knowledge base.
    async fn delete_by_knowledge_base(
        &self,
        scope: &mut TxScope,
        kb_id: KnowledgeBaseId,
    ) -> Result<(), DomainError>;

    /// Returns documents carrying at least one of the given tags.
    async fn search_by_tags(
        &self,
        scope: &mut TxScope,
        tags: &[String],
    ) -> Result<Vec<Document>, DomainError>;
}
