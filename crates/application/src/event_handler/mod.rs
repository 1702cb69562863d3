//! Built-in event handlers.
//!
//! These are the in-process consumers of domain events: lifecycle loggers
//! subscribed by event name, a search-index maintainer, and a global audit
//! trail. Real deployments would swap the log statements for calls into a
//! search engine, cache, or notification service.

mod audit_log;
mod knowledge_base_handlers;
mod search_index;

pub use audit_log::AuditLogHandler;
pub use knowledge_base_handlers::{DocumentAddedHandler, KnowledgeBaseCreatedHandler};
pub use search_index::SearchIndexHandler;

use std::sync::Arc;

use event_bus::EventBus;

/// Subscribes the built-in handlers on a bus.
///
/// Called once at composition time, before the first command runs.
pub fn register_default_handlers(bus: &dyn EventBus) {
    bus.subscribe(
        "knowledge_base.created",
        Arc::new(KnowledgeBaseCreatedHandler::new()),
    );
    bus.subscribe("document.added", Arc::new(DocumentAddedHandler::new()));
    bus.subscribe_all(Arc::new(SearchIndexHandler::new()));
    bus.subscribe_all(Arc::new(AuditLogHandler::new()));
}
