//! Handler registry shared by all bus variants.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use domain::DomainEvent;

use crate::bus::EventHandler;

#[derive(Default)]
struct Inner {
    by_name: HashMap<String, Vec<Arc<dyn EventHandler>>>,
    all_events: Vec<Arc<dyn EventHandler>>,
}

/// Mapping from event name to handler list, plus the all-events handlers.
///
/// Owned by the bus instance, never a package-level singleton. Writers
/// (subscribe calls, expected only at startup) take the exclusive lock;
/// readers (dispatch, per published event) take the shared lock. Handler
/// `Arc`s are cloned out under the read guard so no lock is held across an
/// await point.
#[derive(Default)]
pub struct HandlerRegistry {
    inner: RwLock<Inner>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for events with the given name.
    pub fn subscribe(&self, event_name: &str, handler: Arc<dyn EventHandler>) {
        let mut inner = self.inner.write().expect("handler registry lock poisoned");
        tracing::debug!(event_name, handler = handler.name(), "registered event handler");
        inner
            .by_name
            .entry(event_name.to_owned())
            .or_default()
            .push(handler);
    }

    /// Registers a handler for every event.
    pub fn subscribe_all(&self, handler: Arc<dyn EventHandler>) {
        let mut inner = self.inner.write().expect("handler registry lock poisoned");
        tracing::debug!(handler = handler.name(), "registered all-events handler");
        inner.all_events.push(handler);
    }

    /// Returns the handlers matching an event name: specific handlers first,
    /// then all-events handlers, each group in registration order.
    pub fn handlers_for(&self, event_name: &str) -> Vec<Arc<dyn EventHandler>> {
        let inner = self.inner.read().expect("handler registry lock poisoned");
        let mut handlers = Vec::new();
        if let Some(specific) = inner.by_name.get(event_name) {
            handlers.extend(specific.iter().cloned());
        }
        handlers.extend(inner.all_events.iter().cloned());
        handlers
    }

    /// Invokes every matching handler for the event.
    ///
    /// A handler failure is logged and counted but does not prevent the
    /// remaining handlers from running; dispatch itself always succeeds.
    pub async fn dispatch(&self, event: &DomainEvent) {
        let handlers = self.handlers_for(event.event_name());
        metrics::counter!("event_bus_events_dispatched").increment(1);

        for handler in handlers {
            if let Err(err) = handler.handle(event).await {
                metrics::counter!("event_bus_handler_failures").increment(1);
                tracing::warn!(
                    handler = handler.name(),
                    event_name = event.event_name(),
                    error = %err,
                    "event handler failed"
                );
            }
        }
    }
}
