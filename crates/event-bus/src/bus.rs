//! The event bus capability traits.

use std::sync::Arc;

use async_trait::async_trait;
use domain::DomainEvent;

use crate::error::DeliveryError;

/// Processes domain events it subscribed to.
///
/// Handlers must tolerate redelivery: the distributed variant guarantees
/// at-least-once, not exactly-once.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Short name used in logs and failure reports.
    fn name(&self) -> &'static str;

    /// Handles one event. Errors are reported by the bus but do not stop
    /// delivery to other handlers.
    async fn handle(&self, event: &DomainEvent) -> Result<(), DeliveryError>;
}

/// Publish/subscribe capability shared by all bus variants.
///
/// Subscriptions are expected at startup; publishing happens per command.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publishes a single event to every matching handler.
    async fn publish(&self, event: DomainEvent) -> Result<(), DeliveryError>;

    /// Publishes a batch of events in order.
    async fn publish_all(&self, events: Vec<DomainEvent>) -> Result<(), DeliveryError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }

    /// Subscribes a handler to events with the given name.
    fn subscribe(&self, event_name: &str, handler: Arc<dyn EventHandler>);

    /// Subscribes a handler to every event.
    fn subscribe_all(&self, handler: Arc<dyn EventHandler>);
}
