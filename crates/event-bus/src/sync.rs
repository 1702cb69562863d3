//! Synchronous in-process event bus.

use std::sync::Arc;

use async_trait::async_trait;
use domain::DomainEvent;

use crate::bus::{EventBus, EventHandler};
use crate::error::DeliveryError;
use crate::registry::HandlerRegistry;

/// Runs every matching handler on the caller's task before `publish`
/// returns.
///
/// Handler execution for event N fully completes before `publish` for
/// event N returns, so this variant has the strongest ordering guarantee
/// of the three.
#[derive(Default)]
pub struct SyncEventBus {
    registry: HandlerRegistry,
}

impl SyncEventBus {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventBus for SyncEventBus {
    async fn publish(&self, event: DomainEvent) -> Result<(), DeliveryError> {
        tracing::debug!(event_name = event.event_name(), "publishing event");
        self.registry.dispatch(&event).await;
        Ok(())
    }

    fn subscribe(&self, event_name: &str, handler: Arc<dyn EventHandler>) {
        self.registry.subscribe(event_name, handler);
    }

    fn subscribe_all(&self, handler: Arc<dyn EventHandler>) {
        self.registry.subscribe_all(handler);
    }
}
