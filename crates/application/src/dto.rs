//! Plain data records handed across the transport boundary.

use chrono::{DateTime, Utc};
use domain::{Document, KnowledgeBase};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentDto {
    pub id: String,
    pub knowledge_base_id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentDto {
    pub fn from_entity(doc: &Document) -> Self {
        Self {
            id: doc.id().to_string(),
            knowledge_base_id: doc.knowledge_base_id().to_string(),
            title: doc.title().to_owned(),
            content: doc.content().to_owned(),
            tags: doc.tags().to_vec(),
            created_at: doc.created_at(),
            updated_at: doc.updated_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseDto {
    pub id: String,
    pub name: String,
    pub description: String,
    pub document_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<DocumentDto>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KnowledgeBaseDto {
    pub fn from_aggregate(kb: &KnowledgeBase, include_documents: bool) -> Self {
        Self {
            id: kb.id().to_string(),
            name: kb.name().to_owned(),
            description: kb.description().to_owned(),
            document_count: kb.document_count(),
            documents: include_documents
                .then(|| kb.documents().iter().map(DocumentDto::from_entity).collect()),
            created_at: kb.created_at(),
            updated_at: kb.updated_at(),
        }
    }
}

/// Summary of a completed merge, assembled after the transaction commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeResultDto {
    pub source_id: String,
    pub source_name: String,
    pub target_id: String,
    pub target_name: String,
    pub documents_moved: usize,
    pub source_deleted: bool,
}
