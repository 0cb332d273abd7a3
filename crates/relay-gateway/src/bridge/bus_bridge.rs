//! Bus bridge
//!
//! Consumes the bus subscription in order and hands each event to the
//! dispatcher for its target room. One message is fully fanned out before the
//! next is read.

use crate::broadcast::{BroadcastDispatcher, DeliveryReport};
use crate::events::Event;
use crate::registry::RoomRegistry;
use futures_util::{Stream, StreamExt};
use relay_bus::BusMessage;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for messages seen by the bridge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BridgeStats {
    /// Messages read from the bus
    pub received: u64,
    /// Messages dropped because they did not decode
    pub dropped: u64,
    /// Member writes that succeeded
    pub delivered: u64,
    /// Member writes that failed
    pub failed: u64,
}

/// Routes bus messages to room members
pub struct BusBridge {
    registry: Arc<RoomRegistry>,
    dispatcher: BroadcastDispatcher,
    received: AtomicU64,
    dropped: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl BusBridge {
    /// Create a bridge over a registry
    pub fn new(registry: Arc<RoomRegistry>, dispatcher: BroadcastDispatcher) -> Self {
        Self {
            registry,
            dispatcher,
            received: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// Decode a raw bus payload into an event
    pub fn decode(message: &BusMessage) -> Result<Event, serde_json::Error> {
        Event::from_json(&message.payload)
    }

    /// Handle one bus message
    ///
    /// Returns `None` when the message could not be decoded.
    pub async fn handle_message(&self, message: BusMessage) -> Option<DeliveryReport> {
        self.received.fetch_add(1, Ordering::Relaxed);

        let event = match Self::decode(&message) {
            Ok(event) => event,
            Err(e) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    topic = %message.topic,
                    error = %e,
                    "Dropping undecodable bus message"
                );
                return None;
            }
        };

        let room = event.target_room();
        let members = self.registry.snapshot(room);

        if members.is_empty() {
            tracing::debug!(
                topic = %message.topic,
                room = %room,
                kind = %event.kind,
                "No members for event"
            );
        }

        let report = self.dispatcher.deliver(room, &event, &members).await;

        self.delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.failed
            .fetch_add(report.failed as u64, Ordering::Relaxed);

        Some(report)
    }

    /// Consume the subscription until it ends
    pub async fn run<S>(&self, mut messages: S)
    where
        S: Stream<Item = BusMessage> + Unpin,
    {
        tracing::info!("Bus bridge started");

        while let Some(message) = messages.next().await {
            self.handle_message(message).await;
        }

        tracing::warn!("Bus subscription ended");
    }

    /// Snapshot of the bridge counters
    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            received: self.received.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for BusBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusBridge")
            .field("dispatcher", &self.dispatcher)
            .field("stats", &self.stats())
            .finish()
    }
}
