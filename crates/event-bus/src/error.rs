//! Event delivery errors.
//!
//! Delivery failures are never fatal to the command that produced the
//! events: by the time anything here can fail, the state change is already
//! durably committed. Callers log these and move on.

use thiserror::Error;

/// Errors that can occur while publishing or dispatching events.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// A subscribed handler returned an error.
    #[error("handler {handler} failed for {event_name}: {message}")]
    Handler {
        handler: String,
        event_name: String,
        message: String,
    },

    /// The event could not be serialized into its wire envelope.
    #[error("failed to encode event envelope: {0}")]
    Encode(#[from] serde_json::Error),

    /// A wire envelope could not be decoded back into a domain event.
    #[error("failed to decode event envelope: {0}")]
    Decode(String),

    /// The partitioned log rejected a send.
    #[error("partitioned log send failed: {0}")]
    Send(String),

    /// A partition index outside the log's range was addressed.
    #[error("partition {0} out of range")]
    UnknownPartition(u32),
}

impl DeliveryError {
    /// Convenience constructor for handler-side failures.
    pub fn handler(
        handler: impl Into<String>,
        event_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        DeliveryError::Handler {
            handler: handler.into(),
            event_name: event_name.into(),
            message: message.into(),
        }
    }
}
