//! Application layer: command handlers, queries, DTOs, and the built-in
//! event handlers.
//!
//! Command handlers own the persist-then-publish protocol: everything that
//! touches storage runs inside the unit of work; events buffered by the
//! aggregate are pulled and handed to the event bus only after the
//! transaction has committed, and a delivery failure never re-fails the
//! command.

pub mod command;
pub mod dto;
pub mod event_handler;
pub mod query;

pub use command::{
    AddDocument, AddDocumentHandler, CreateKnowledgeBase, CreateKnowledgeBaseHandler,
    DeleteKnowledgeBase, DeleteKnowledgeBaseHandler, MergeKnowledgeBases,
    MergeKnowledgeBasesHandler, RemoveDocument, RemoveDocumentHandler, UpdateKnowledgeBase,
    UpdateKnowledgeBaseHandler,
};
pub use dto::{DocumentDto, KnowledgeBaseDto, MergeResultDto};
pub use event_handler::{
    AuditLogHandler, DocumentAddedHandler, KnowledgeBaseCreatedHandler, SearchIndexHandler,
    register_default_handlers,
};
pub use query::{GetKnowledgeBase, ListDocuments, ListKnowledgeBases, SearchDocumentsByTags};
