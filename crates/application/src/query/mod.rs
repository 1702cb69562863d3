//! Read-side queries.
//!
//! Queries run outside any transaction, on the ambient connection.

mod get_knowledge_base;
mod list_documents;
mod list_knowledge_bases;

pub use get_knowledge_base::GetKnowledgeBase;
pub use list_documents::{ListDocuments, SearchDocumentsByTags};
pub use list_knowledge_bases::ListKnowledgeBases;
