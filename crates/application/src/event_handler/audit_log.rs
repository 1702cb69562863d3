//! Audit trail over every domain event.

use async_trait::async_trait;
use domain::DomainEvent;
use event_bus::{DeliveryError, EventHandler};

/// Records every event for auditing. Subscribed to all events.
#[derive(Default)]
pub struct AuditLogHandler;

impl AuditLogHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventHandler for AuditLogHandler {
    fn name(&self) -> &'static str {
        "audit-log"
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), DeliveryError> {
        tracing::info!(
            event_id = %event.id(),
            event_name = event.event_name(),
            aggregate_id = %event.aggregate_id(),
            occurred_at = %event.occurred_at(),
            "audit"
        );
        Ok(())
    }
}
