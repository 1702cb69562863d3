//! Domain events collected by the aggregate.
//!
//! Events are immutable facts named in past tense. They exist only
//! transiently in the aggregate's buffer until drained by `pull_events`
//! after the surrounding transaction has committed.

use chrono::{DateTime, Utc};
use common::{DocumentId, EventId, KnowledgeBaseId};
use serde::{Deserialize, Serialize};

/// Event-specific payload, tagged with the wire-visible event name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_name")]
pub enum EventPayload {
    #[serde(rename = "knowledge_base.created")]
    KnowledgeBaseCreated { name: String, description: String },

    #[serde(rename = "knowledge_base.updated")]
    KnowledgeBaseUpdated {
        old_name: String,
        new_name: String,
        old_description: String,
        new_description: String,
    },

    #[serde(rename = "knowledge_base.deleted")]
    KnowledgeBaseDeleted { name: String },

    #[serde(rename = "document.added")]
    DocumentAdded {
        document_id: DocumentId,
        title: String,
        tags: Vec<String>,
    },

    #[serde(rename = "document.removed")]
    DocumentRemoved {
        document_id: DocumentId,
        title: String,
    },

    #[serde(rename = "document.updated")]
    DocumentUpdated {
        document_id: DocumentId,
        old_title: String,
        new_title: String,
    },
}

impl EventPayload {
    /// Returns the wire-visible event name, matching the serde tag.
    pub fn event_name(&self) -> &'static str {
        match self {
            EventPayload::KnowledgeBaseCreated { .. } => "knowledge_base.created",
            EventPayload::KnowledgeBaseUpdated { .. } => "knowledge_base.updated",
            EventPayload::KnowledgeBaseDeleted { .. } => "knowledge_base.deleted",
            EventPayload::DocumentAdded { .. } => "document.added",
            EventPayload::DocumentRemoved { .. } => "document.removed",
            EventPayload::DocumentUpdated { .. } => "document.updated",
        }
    }
}

/// A fact about a knowledge base, recorded at the moment of mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    id: EventId,
    aggregate_id: KnowledgeBaseId,
    occurred_at: DateTime<Utc>,
    payload: EventPayload,
}

impl DomainEvent {
    /// Records a new event against the given aggregate.
    pub fn new(aggregate_id: KnowledgeBaseId, payload: EventPayload) -> Self {
        Self {
            id: EventId::new(),
            aggregate_id,
            occurred_at: Utc::now(),
            payload,
        }
    }

    /// Rebuilds an event from its constituent parts.
    ///
    /// Used by the distributed consumer when decoding a wire envelope back
    /// into an event with the same accessor contract as in-process events.
    pub fn from_parts(
        id: EventId,
        aggregate_id: KnowledgeBaseId,
        occurred_at: DateTime<Utc>,
        payload: EventPayload,
    ) -> Self {
        Self {
            id,
            aggregate_id,
            occurred_at,
            payload,
        }
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn aggregate_id(&self) -> KnowledgeBaseId {
        self.aggregate_id
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    /// Returns the event name, e.g. `knowledge_base.created`.
    pub fn event_name(&self) -> &'static str {
        self.payload.event_name()
    }
}
