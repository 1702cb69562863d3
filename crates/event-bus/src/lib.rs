//! Event bus variants for the knowledge-base backend.
//!
//! One capability trait ([`EventBus`]) with three interchangeable
//! implementations, selected at composition time:
//!
//! - [`SyncEventBus`] — handlers run on the caller's task before `publish`
//!   returns; use when handlers are cheap and must complete first.
//! - [`QueuedEventBus`] — a bounded queue consumed by a fixed worker pool;
//!   a full queue degrades to inline dispatch so no event is ever dropped.
//! - [`PartitionedEventBus`] — serializes events into wire envelopes and
//!   appends them to a partitioned log keyed by aggregate id; a companion
//!   [`LogConsumer`] redispatches them with at-least-once semantics.
//!
//! All variants share the same [`HandlerRegistry`] dispatch contract:
//! handlers registered for the event's name run first, then all-events
//! handlers, in registration order; a handler failure is logged and never
//! prevents the remaining handlers from running.

pub mod bus;
pub mod envelope;
pub mod error;
pub mod log;
pub mod partitioned;
pub mod queued;
pub mod registry;
pub mod sync;

pub use bus::{EventBus, EventHandler};
pub use envelope::{EventMessage, EventMetadata, SCHEMA_VERSION};
pub use error::DeliveryError;
pub use log::{InMemoryPartitionedLog, LogRecord, PartitionedLog, partition_for};
pub use partitioned::{ConsumerConfig, ConsumerHandle, LogConsumer, PartitionedEventBus};
pub use queued::QueuedEventBus;
pub use registry::HandlerRegistry;
pub use sync::SyncEventBus;
