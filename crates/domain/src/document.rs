//! The `Document` entity, owned by a knowledge base.

use chrono::{DateTime, Utc};
use common::{DocumentId, KnowledgeBaseId};

use crate::error::DomainError;

/// A document inside a knowledge base.
///
/// Documents are never reachable except through their owning
/// [`KnowledgeBase`](crate::KnowledgeBase): creation, mutation, and removal
/// all flow through the aggregate root.
#[derive(Debug, Clone)]
pub struct Document {
    id: DocumentId,
    knowledge_base_id: KnowledgeBaseId,
    title: String,
    content: String,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Document {
    /// Creates a new document. Only callable by the aggregate.
    pub(crate) fn new(
        knowledge_base_id: KnowledgeBaseId,
        title: String,
        content: String,
        tags: Vec<String>,
    ) -> Result<Self, DomainError> {
        if title.is_empty() {
            return Err(DomainError::TitleEmpty);
        }
        if content.is_empty() {
            return Err(DomainError::ContentEmpty);
        }

        let now = Utc::now();
        Ok(Self {
            id: DocumentId::new(),
            knowledge_base_id,
            title,
            content,
            tags,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds a document from persisted state.
    pub fn reconstruct(
        id: DocumentId,
        knowledge_base_id: KnowledgeBaseId,
        title: String,
        content: String,
        tags: Vec<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            knowledge_base_id,
            title,
            content,
            tags,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn knowledge_base_id(&self) -> KnowledgeBaseId {
        self.knowledge_base_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replaces title and content. Only callable by the aggregate.
    pub(crate) fn update_content(&mut self, title: String, content: String) -> Result<(), DomainError> {
        if title.is_empty() {
            return Err(DomainError::TitleEmpty);
        }
        if content.is_empty() {
            return Err(DomainError::ContentEmpty);
        }
        self.title = title;
        self.content = content;
        self.updated_at = Utc::now();
        Ok(())
    }
}
