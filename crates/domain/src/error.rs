//! Domain error taxonomy.

use common::{DocumentId, KnowledgeBaseId};
use thiserror::Error;

/// Errors produced by domain operations.
///
/// Variants are grouped by [`ErrorKind`], which is the only thing the
/// transport layer is allowed to look at when picking a status code.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Knowledge-base name is empty.
    #[error("knowledge base name cannot be empty")]
    NameEmpty,

    /// Document title is empty.
    #[error("document title cannot be empty")]
    TitleEmpty,

    /// Document content is empty.
    #[error("document content cannot be empty")]
    ContentEmpty,

    /// Source and target of a merge are the same knowledge base.
    #[error("cannot merge a knowledge base with itself")]
    MergeSelf,

    /// An identifier string could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The referenced knowledge base does not exist.
    #[error("knowledge base not found: {0}")]
    KnowledgeBaseNotFound(KnowledgeBaseId),

    /// The referenced document does not exist.
    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),

    /// A knowledge base with this name already exists.
    #[error("knowledge base name already exists: {0}")]
    NameTaken(String),

    /// Transaction begin/commit/rollback failed in the storage backend.
    #[error("transaction failed: {0}")]
    Transaction(String),

    /// A repository operation failed for infrastructure reasons.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Stable classification of a [`DomainError`].
///
/// The excluded transport layer translates these to protocol status codes;
/// the domain never encodes transport concerns itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input or violated invariant.
    Validation,
    /// Referenced aggregate or document absent.
    NotFound,
    /// Duplicate name at creation time.
    Conflict,
    /// Transaction or storage infrastructure failure.
    Internal,
}

impl DomainError {
    /// Returns the stable classification for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::NameEmpty
            | DomainError::TitleEmpty
            | DomainError::ContentEmpty
            | DomainError::MergeSelf
            | DomainError::InvalidId(_) => ErrorKind::Validation,
            DomainError::KnowledgeBaseNotFound(_) | DomainError::DocumentNotFound(_) => {
                ErrorKind::NotFound
            }
            DomainError::NameTaken(_) => ErrorKind::Conflict,
            DomainError::Transaction(_) | DomainError::Storage(_) => ErrorKind::Internal,
        }
    }
}
