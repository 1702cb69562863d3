//! Bounded-queue event bus with a fixed worker pool.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use domain::DomainEvent;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use crate::bus::{EventBus, EventHandler};
use crate::error::DeliveryError;
use crate::registry::HandlerRegistry;

/// Enqueues events into a bounded queue consumed by a fixed pool of worker
/// tasks.
///
/// When the queue is full, `publish` degrades to inline dispatch for that
/// event — an event is never dropped. With more than one worker no
/// cross-event ordering is guaranteed; a single worker preserves FIFO order.
///
/// Must be constructed inside a tokio runtime, since the worker tasks are
/// spawned eagerly.
pub struct QueuedEventBus {
    registry: Arc<HandlerRegistry>,
    sender: Mutex<Option<mpsc::Sender<DomainEvent>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl QueuedEventBus {
    /// Creates a bus with the given queue capacity and worker count.
    ///
    /// Both are clamped to at least 1.
    pub fn new(capacity: usize, worker_count: usize) -> Self {
        let registry = Arc::new(HandlerRegistry::new());
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let workers = (0..worker_count.max(1))
            .map(|id| {
                let registry = Arc::clone(&registry);
                let rx = Arc::clone(&rx);
                tokio::spawn(async move {
                    tracing::debug!(worker = id, "event bus worker started");
                    loop {
                        // The receiver lock is released as soon as an event
                        // arrives, so other workers can receive while this
                        // one dispatches.
                        let event = { rx.lock().await.recv().await };
                        match event {
                            Some(event) => registry.dispatch(&event).await,
                            None => break,
                        }
                    }
                    tracing::debug!(worker = id, "event bus worker stopped");
                })
            })
            .collect();

        Self {
            registry: Arc::clone(&registry),
            sender: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
        }
    }

    /// Closes the queue and waits for the workers to drain it.
    ///
    /// Events already enqueued (or in flight on a worker) are fully
    /// processed before this returns. Publishing after close falls back to
    /// inline dispatch.
    pub async fn close(&self) {
        let sender = self
            .sender
            .lock()
            .expect("queued bus sender lock poisoned")
            .take();
        drop(sender);

        let handles: Vec<_> = {
            let mut workers = self.workers.lock().expect("queued bus worker lock poisoned");
            workers.drain(..).collect()
        };
        for handle in handles {
            let _ = handle.await;
        }
        tracing::debug!("queued event bus closed");
    }
}

#[async_trait]
impl EventBus for QueuedEventBus {
    async fn publish(&self, event: DomainEvent) -> Result<(), DeliveryError> {
        let sender = {
            self.sender
                .lock()
                .expect("queued bus sender lock poisoned")
                .clone()
        };

        let Some(sender) = sender else {
            // Bus already closed: dispatch inline rather than dropping.
            self.registry.dispatch(&event).await;
            return Ok(());
        };

        match sender.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(event)) => {
                tracing::warn!(
                    event_name = event.event_name(),
                    "event queue full, dispatching inline"
                );
                metrics::counter!("event_bus_queue_overflows").increment(1);
                self.registry.dispatch(&event).await;
                Ok(())
            }
            Err(TrySendError::Closed(event)) => {
                self.registry.dispatch(&event).await;
                Ok(())
            }
        }
    }

    fn subscribe(&self, event_name: &str, handler: Arc<dyn EventHandler>) {
        self.registry.subscribe(event_name, handler);
    }

    fn subscribe_all(&self, handler: Arc<dyn EventHandler>) {
        self.registry.subscribe_all(handler);
    }
}
