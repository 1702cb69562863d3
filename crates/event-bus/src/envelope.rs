//! Wire-visible message envelope for the distributed bus variant.

use chrono::{DateTime, Utc};
use common::{EventId, KnowledgeBaseId};
use domain::{DomainEvent, EventPayload};
use serde::{Deserialize, Serialize};

use crate::error::DeliveryError;

/// Envelope schema version stamped into message metadata.
pub const SCHEMA_VERSION: &str = "1.0";

/// Optional metadata carried alongside an event on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub producer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
}

/// JSON message envelope sent to the partitioned log.
///
/// The routing key is `aggregate_id`, which is what gives all events of one
/// aggregate a total order on the consumer side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub event_id: String,
    pub event_name: String,
    pub aggregate_id: String,
    pub occurred_at: DateTime<Utc>,
    pub payload: serde_json::Value,
    pub metadata: EventMetadata,
}

impl EventMessage {
    /// Wraps a domain event for the wire.
    pub fn from_event(event: &DomainEvent, producer: &str) -> Result<Self, DeliveryError> {
        Ok(Self {
            event_id: event.id().to_string(),
            event_name: event.event_name().to_owned(),
            aggregate_id: event.aggregate_id().to_string(),
            occurred_at: event.occurred_at(),
            payload: serde_json::to_value(event.payload())?,
            metadata: EventMetadata {
                trace_id: None,
                producer: Some(producer.to_owned()),
                schema_version: Some(SCHEMA_VERSION.to_owned()),
            },
        })
    }

    /// Decodes the envelope back into a domain event exposing the same
    /// accessor contract as in-process events.
    pub fn into_event(self) -> Result<DomainEvent, DeliveryError> {
        let id = self
            .event_id
            .parse::<EventId>()
            .map_err(|e| DeliveryError::Decode(format!("event_id: {e}")))?;
        let aggregate_id = self
            .aggregate_id
            .parse::<KnowledgeBaseId>()
            .map_err(|e| DeliveryError::Decode(format!("aggregate_id: {e}")))?;
        let payload: EventPayload = serde_json::from_value(self.payload)
            .map_err(|e| DeliveryError::Decode(format!("payload: {e}")))?;

        if payload.event_name() != self.event_name {
            return Err(DeliveryError::Decode(format!(
                "event name mismatch: envelope says {}, payload is {}",
                self.event_name,
                payload.event_name()
            )));
        }

        Ok(DomainEvent::from_parts(
            id,
            aggregate_id,
            self.occurred_at,
            payload,
        ))
    }
}
