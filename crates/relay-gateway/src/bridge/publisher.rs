//! Event publishing
//!
//! The reverse path from clients back onto the bus.

use crate::events::Event;
use async_trait::async_trait;
use relay_bus::{Publisher, Topic};
use relay_common::{RelayError, RelayResult};

/// Publishes an event onto the bus
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one event
    async fn publish(&self, event: &Event) -> RelayResult<()>;
}

/// Publishes client events to the chat topic
#[derive(Debug, Clone)]
pub struct BusPublisher {
    publisher: Publisher,
    topic: Topic,
}

impl BusPublisher {
    /// Publish to the chat topic
    #[must_use]
    pub fn new(publisher: Publisher) -> Self {
        Self {
            publisher,
            topic: Topic::Chat,
        }
    }

    /// Topic events are published to
    pub fn topic(&self) -> &Topic {
        &self.topic
    }
}

#[async_trait]
impl EventPublisher for BusPublisher {
    async fn publish(&self, event: &Event) -> RelayResult<()> {
        self.publisher
            .publish(&self.topic, event)
            .await
            .map(|_| ())
            .map_err(RelayError::bus)
    }
}
