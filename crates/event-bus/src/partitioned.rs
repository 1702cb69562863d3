//! Distributed event bus backed by a partitioned log.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domain::DomainEvent;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::bus::{EventBus, EventHandler};
use crate::envelope::EventMessage;
use crate::error::DeliveryError;
use crate::log::{LogRecord, PartitionedLog};
use crate::registry::HandlerRegistry;

/// Publishes events to a partitioned log, keyed by aggregate id.
///
/// Because the key is the aggregate id, all events for one aggregate are
/// observed by any one consumer group in send order; events for different
/// aggregates carry no relative ordering guarantee.
///
/// Subscriptions registered on this bus are served by its companion
/// [`LogConsumer`]s, created via [`consumer`](Self::consumer).
pub struct PartitionedEventBus {
    log: Arc<dyn PartitionedLog>,
    registry: Arc<HandlerRegistry>,
    producer: String,
}

impl PartitionedEventBus {
    pub fn new(log: Arc<dyn PartitionedLog>, producer: impl Into<String>) -> Self {
        Self {
            log,
            registry: Arc::new(HandlerRegistry::new()),
            producer: producer.into(),
        }
    }

    /// Creates a consumer for the given group, sharing this bus's handler
    /// registrations.
    pub fn consumer(&self, config: ConsumerConfig) -> LogConsumer {
        LogConsumer::new(Arc::clone(&self.log), Arc::clone(&self.registry), config)
    }
}

#[async_trait]
impl EventBus for PartitionedEventBus {
    async fn publish(&self, event: DomainEvent) -> Result<(), DeliveryError> {
        let message = EventMessage::from_event(&event, &self.producer)?;
        let bytes = serde_json::to_vec(&message)?;
        self.log.send(&message.aggregate_id, bytes).await?;
        metrics::counter!("event_bus_events_published").increment(1);
        tracing::debug!(
            event_name = %message.event_name,
            aggregate_id = %message.aggregate_id,
            "event sent to partitioned log"
        );
        Ok(())
    }

    fn subscribe(&self, event_name: &str, handler: Arc<dyn EventHandler>) {
        self.registry.subscribe(event_name, handler);
    }

    fn subscribe_all(&self, handler: Arc<dyn EventHandler>) {
        self.registry.subscribe_all(handler);
    }
}

/// Consumer tuning knobs.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Consumer group name; offsets are tracked per group.
    pub group: String,
    /// Partitions this member is responsible for; `None` means all of them.
    pub partitions: Option<Vec<u32>>,
    /// How often read positions are committed, independent of handler
    /// success.
    pub commit_interval: Duration,
    /// Idle sleep between polls when no records arrived.
    pub poll_interval: Duration,
    /// Maximum records fetched per partition per poll.
    pub batch_size: usize,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            group: "knowledge-service".to_owned(),
            partitions: None,
            commit_interval: Duration::from_secs(1),
            poll_interval: Duration::from_millis(50),
            batch_size: 64,
        }
    }
}

impl ConsumerConfig {
    pub fn with_group(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            ..Self::default()
        }
    }
}

/// Reads envelopes from the log, decodes them back into domain events, and
/// redispatches them through the handler registry.
///
/// Read positions are committed on a timer, not per message, so delivery is
/// at-least-once: a crash between dispatch and commit replays the tail of
/// the partition on restart. Undecodable records are logged and skipped.
pub struct LogConsumer {
    log: Arc<dyn PartitionedLog>,
    registry: Arc<HandlerRegistry>,
    config: ConsumerConfig,
    positions: HashMap<u32, u64>,
}

impl LogConsumer {
    pub fn new(
        log: Arc<dyn PartitionedLog>,
        registry: Arc<HandlerRegistry>,
        config: ConsumerConfig,
    ) -> Self {
        Self {
            log,
            registry,
            config,
            positions: HashMap::new(),
        }
    }

    /// Spawns the consume loop, returning a handle that stops it.
    pub fn spawn(self) -> ConsumerHandle {
        let (stop_tx, stop_rx) = oneshot::channel();
        let join = tokio::spawn(self.run(stop_rx));
        ConsumerHandle {
            stop: stop_tx,
            join,
        }
    }

    async fn run(mut self, mut stop: oneshot::Receiver<()>) {
        let partitions: Vec<u32> = match &self.config.partitions {
            Some(assigned) => assigned.clone(),
            None => (0..self.log.partition_count()).collect(),
        };

        // Resume from the group's committed positions.
        for &partition in &partitions {
            let offset = match self.log.committed_offset(&self.config.group, partition).await {
                Ok(offset) => offset,
                Err(err) => {
                    tracing::error!(partition, error = %err, "failed to read committed offset");
                    0
                }
            };
            self.positions.insert(partition, offset);
        }

        tracing::info!(
            group = %self.config.group,
            partitions = partitions.len(),
            "log consumer started"
        );

        let mut last_commit = Instant::now();
        loop {
            match stop.try_recv() {
                Ok(()) | Err(oneshot::error::TryRecvError::Closed) => {
                    self.commit_positions().await;
                    tracing::info!(group = %self.config.group, "log consumer stopped");
                    return;
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
            }

            let processed = self.poll(&partitions).await;

            if last_commit.elapsed() >= self.config.commit_interval {
                self.commit_positions().await;
                last_commit = Instant::now();
            }

            if processed == 0 {
                tokio::time::sleep(self.config.poll_interval).await;
            }
        }
    }

    /// Fetches and dispatches one batch per assigned partition, returning
    /// the number of records processed.
    async fn poll(&mut self, partitions: &[u32]) -> usize {
        let mut processed = 0;
        for &partition in partitions {
            let from = self.positions.get(&partition).copied().unwrap_or(0);
            let batch = match self.log.fetch(partition, from, self.config.batch_size).await {
                Ok(batch) => batch,
                Err(err) => {
                    tracing::error!(partition, error = %err, "fetch from partitioned log failed");
                    continue;
                }
            };

            for record in batch {
                self.dispatch_record(&record).await;
                self.positions.insert(partition, record.offset + 1);
                processed += 1;
            }
        }
        processed
    }

    async fn dispatch_record(&self, record: &LogRecord) {
        let message: EventMessage = match serde_json::from_slice(&record.value) {
            Ok(message) => message,
            Err(err) => {
                tracing::error!(
                    partition = record.partition,
                    offset = record.offset,
                    error = %err,
                    "skipping undecodable log record"
                );
                return;
            }
        };

        match message.into_event() {
            Ok(event) => {
                tracing::debug!(
                    event_name = event.event_name(),
                    partition = record.partition,
                    offset = record.offset,
                    "consumed event from partitioned log"
                );
                self.registry.dispatch(&event).await;
            }
            Err(err) => {
                tracing::error!(
                    partition = record.partition,
                    offset = record.offset,
                    error = %err,
                    "skipping undecodable event envelope"
                );
            }
        }
    }

    async fn commit_positions(&self) {
        for (&partition, &offset) in &self.positions {
            if let Err(err) = self
                .log
                .commit_offset(&self.config.group, partition, offset)
                .await
            {
                tracing::error!(partition, error = %err, "offset commit failed");
            }
        }
    }
}

/// Handle to a spawned [`LogConsumer`].
pub struct ConsumerHandle {
    stop: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl ConsumerHandle {
    /// Signals the consumer to stop and waits for its final offset commit.
    pub async fn stop(self) {
        let _ = self.stop.send(());
        let _ = self.join.await;
    }
}
