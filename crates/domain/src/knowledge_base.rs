//! The `KnowledgeBase` aggregate root.

use chrono::{DateTime, Utc};
use common::{DocumentId, KnowledgeBaseId};

use crate::document::Document;
use crate::error::DomainError;
use crate::event::{DomainEvent, EventPayload};

/// Aggregate root owning a collection of documents.
///
/// Every mutation validates its preconditions and, on success, appends
/// exactly one event to the in-memory buffer. The buffer is drained with
/// [`pull_events`](Self::pull_events) after the surrounding transaction has
/// committed; it is never persisted and never populated by reconstruction.
#[derive(Debug)]
pub struct KnowledgeBase {
    id: KnowledgeBaseId,
    name: String,
    description: String,
    documents: Vec<Document>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

impl KnowledgeBase {
    /// Creates a new knowledge base with a fresh id.
    ///
    /// Name uniqueness across aggregates is a cross-aggregate rule enforced
    /// by [`KnowledgeService`](crate::KnowledgeService), not here.
    pub fn create(name: String, description: String) -> Result<Self, DomainError> {
        if name.is_empty() {
            return Err(DomainError::NameEmpty);
        }

        let now = Utc::now();
        let mut kb = Self {
            id: KnowledgeBaseId::new(),
            name,
            description,
            documents: Vec::new(),
            created_at: now,
            updated_at: now,
            events: Vec::new(),
        };
        kb.record(EventPayload::KnowledgeBaseCreated {
            name: kb.name.clone(),
            description: kb.description.clone(),
        });
        Ok(kb)
    }

    /// Rebuilds an aggregate from persisted state.
    ///
    /// Rehydration is not a business event, so the event buffer starts empty.
    pub fn reconstruct(
        id: KnowledgeBaseId,
        name: String,
        description: String,
        documents: Vec<Document>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            documents,
            created_at,
            updated_at,
            events: Vec::new(),
        }
    }

    pub fn id(&self) -> KnowledgeBaseId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn get_document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.iter().find(|d| d.id() == id)
    }

    /// Updates name and description, recording old and new values.
    pub fn update_info(&mut self, name: String, description: String) -> Result<(), DomainError> {
        if name.is_empty() {
            return Err(DomainError::NameEmpty);
        }

        let old_name = std::mem::replace(&mut self.name, name);
        let old_description = std::mem::replace(&mut self.description, description);
        self.updated_at = Utc::now();
        self.record(EventPayload::KnowledgeBaseUpdated {
            old_name,
            new_name: self.name.clone(),
            old_description,
            new_description: self.description.clone(),
        });
        Ok(())
    }

    /// Adds a new document to this knowledge base.
    pub fn add_document(
        &mut self,
        title: String,
        content: String,
        tags: Vec<String>,
    ) -> Result<&Document, DomainError> {
        let doc = Document::new(self.id, title, content, tags)?;
        let payload = EventPayload::DocumentAdded {
            document_id: doc.id(),
            title: doc.title().to_owned(),
            tags: doc.tags().to_vec(),
        };
        self.documents.push(doc);
        self.updated_at = Utc::now();
        self.record(payload);
        Ok(self
            .documents
            .last()
            .expect("documents is non-empty after push"))
    }

    /// Removes the document with the given id.
    pub fn remove_document(&mut self, id: DocumentId) -> Result<(), DomainError> {
        let idx = self
            .documents
            .iter()
            .position(|d| d.id() == id)
            .ok_or(DomainError::DocumentNotFound(id))?;
        let doc = self.documents.remove(idx);
        self.updated_at = Utc::now();
        self.record(EventPayload::DocumentRemoved {
            document_id: id,
            title: doc.title().to_owned(),
        });
        Ok(())
    }

    /// Replaces title and content of an owned document.
    pub fn update_document(
        &mut self,
        id: DocumentId,
        title: String,
        content: String,
    ) -> Result<&Document, DomainError> {
        // Validate before locating so a failed call leaves no partial state.
        if title.is_empty() {
            return Err(DomainError::TitleEmpty);
        }
        if content.is_empty() {
            return Err(DomainError::ContentEmpty);
        }

        let idx = self
            .documents
            .iter()
            .position(|d| d.id() == id)
            .ok_or(DomainError::DocumentNotFound(id))?;
        let old_title = self.documents[idx].title().to_owned();
        self.documents[idx].update_content(title, content)?;
        self.updated_at = Utc::now();
        let new_title = self.documents[idx].title().to_owned();
        self.record(EventPayload::DocumentUpdated {
            document_id: id,
            old_title,
            new_title,
        });
        Ok(&self.documents[idx])
    }

    /// Buffers a deletion event.
    ///
    /// The state change itself is the repository delete performed by the
    /// command handler; this only announces it through the usual
    /// persist-then-publish protocol.
    pub fn mark_deleted(&mut self) {
        self.record(EventPayload::KnowledgeBaseDeleted {
            name: self.name.clone(),
        });
    }

    /// Drains the event buffer, returning the events in emission order.
    ///
    /// Safe to call on an empty buffer. This is the only sanctioned way to
    /// observe buffered events.
    pub fn pull_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    fn record(&mut self, payload: EventPayload) {
        self.events.push(DomainEvent::new(self.id, payload));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> KnowledgeBase {
        KnowledgeBase::create("team notes".into(), "shared notes".into()).unwrap()
    }

    #[test]
    fn create_buffers_exactly_one_created_event() {
        let mut kb = base();
        let events = kb.pull_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_name(), "knowledge_base.created");
        assert_eq!(events[0].aggregate_id(), kb.id());
        match events[0].payload() {
            EventPayload::KnowledgeBaseCreated { name, .. } => assert_eq!(name, "team notes"),
            other => panic!("unexpected payload: {other:?}"),
        }

        // Second drain with no intervening mutation yields nothing.
        assert!(kb.pull_events().is_empty());
    }

    #[test]
    fn create_with_empty_name_fails() {
        let err = KnowledgeBase::create(String::new(), "desc".into()).unwrap_err();
        assert!(matches!(err, DomainError::NameEmpty));
    }

    #[test]
    fn mutation_sequence_yields_events_in_call_order() {
        let mut kb = base();
        let doc_id = kb
            .add_document("a".into(), "alpha".into(), vec![])
            .unwrap()
            .id();
        kb.add_document("b".into(), "beta".into(), vec!["tag".into()])
            .unwrap();
        kb.remove_document(doc_id).unwrap();

        let names: Vec<_> = kb.pull_events().iter().map(|e| e.event_name()).collect();
        assert_eq!(
            names,
            vec![
                "knowledge_base.created",
                "document.added",
                "document.added",
                "document.removed",
            ]
        );
    }

    #[test]
    fn update_info_records_old_and_new_values() {
        let mut kb = base();
        kb.pull_events();
        kb.update_info("renamed".into(), "new desc".into()).unwrap();

        let events = kb.pull_events();
        assert_eq!(events.len(), 1);
        match events[0].payload() {
            EventPayload::KnowledgeBaseUpdated {
                old_name, new_name, ..
            } => {
                assert_eq!(old_name, "team notes");
                assert_eq!(new_name, "renamed");
            }
            other => panic!("unexpected payload: {other:?}"),
        }
        assert_eq!(kb.name(), "renamed");
    }

    #[test]
    fn update_info_with_empty_name_leaves_state_untouched() {
        let mut kb = base();
        kb.pull_events();
        let err = kb.update_info(String::new(), "x".into()).unwrap_err();
        assert!(matches!(err, DomainError::NameEmpty));
        assert_eq!(kb.name(), "team notes");
        assert!(kb.pull_events().is_empty());
    }

    #[test]
    fn add_document_validates_title_and_content() {
        let mut kb = base();
        kb.pull_events();

        assert!(matches!(
            kb.add_document(String::new(), "body".into(), vec![]),
            Err(DomainError::TitleEmpty)
        ));
        assert!(matches!(
            kb.add_document("title".into(), String::new(), vec![]),
            Err(DomainError::ContentEmpty)
        ));
        assert_eq!(kb.document_count(), 0);
        assert!(kb.pull_events().is_empty());
    }

    #[test]
    fn documents_get_unique_ids() {
        let mut kb = base();
        let a = kb.add_document("a".into(), "x".into(), vec![]).unwrap().id();
        let b = kb.add_document("b".into(), "y".into(), vec![]).unwrap().id();
        assert_ne!(a, b);
    }

    #[test]
    fn remove_missing_document_fails_and_changes_nothing() {
        let mut kb = base();
        kb.add_document("keep".into(), "body".into(), vec![]).unwrap();
        kb.pull_events();

        let err = kb.remove_document(DocumentId::new()).unwrap_err();
        assert!(matches!(err, DomainError::DocumentNotFound(_)));
        assert_eq!(kb.document_count(), 1);
        assert!(kb.pull_events().is_empty());
    }

    #[test]
    fn update_document_records_title_transition() {
        let mut kb = base();
        let id = kb
            .add_document("draft".into(), "body".into(), vec![])
            .unwrap()
            .id();
        kb.pull_events();

        kb.update_document(id, "final".into(), "body v2".into())
            .unwrap();
        let events = kb.pull_events();
        assert_eq!(events.len(), 1);
        match events[0].payload() {
            EventPayload::DocumentUpdated {
                old_title,
                new_title,
                ..
            } => {
                assert_eq!(old_title, "draft");
                assert_eq!(new_title, "final");
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn update_missing_document_fails() {
        let mut kb = base();
        kb.pull_events();
        let err = kb
            .update_document(DocumentId::new(), "t".into(), "c".into())
            .unwrap_err();
        assert!(matches!(err, DomainError::DocumentNotFound(_)));
        assert!(kb.pull_events().is_empty());
    }

    #[test]
    fn reconstruct_starts_with_empty_buffer() {
        let original = base();
        let id = original.id();
        let mut kb = KnowledgeBase::reconstruct(
            id,
            "team notes".into(),
            "shared notes".into(),
            Vec::new(),
            original.created_at(),
            original.updated_at(),
        );
        assert!(kb.pull_events().is_empty());
        assert_eq!(kb.id(), id);
    }

    #[test]
    fn mark_deleted_buffers_deleted_event() {
        let mut kb = base();
        kb.pull_events();
        kb.mark_deleted();
        let events = kb.pull_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_name(), "knowledge_base.deleted");
    }
}
