//! Broadcast dispatcher
//!
//! Fans one event out to a snapshot of room members. Member failures are
//! logged and never affect the other members or the caller.

use crate::connection::ConnectionHandle;
use crate::events::Event;
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;

/// Default number of member writes in flight per broadcast
pub const DEFAULT_FANOUT_CONCURRENCY: usize = 64;

/// Outcome of one broadcast
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    /// Room the event was delivered to
    pub room: String,
    /// Members in the snapshot
    pub attempted: usize,
    /// Members that accepted the write
    pub delivered: usize,
    /// Members whose write failed or timed out
    pub failed: usize,
}

impl DeliveryReport {
    fn empty(room: &str) -> Self {
        Self {
            room: room.to_string(),
            ..Self::default()
        }
    }
}

/// Delivers events to room members
#[derive(Debug, Clone)]
pub struct BroadcastDispatcher {
    concurrency: usize,
}

impl BroadcastDispatcher {
    /// Create a dispatcher writing to at most `concurrency` members at once
    #[must_use]
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    /// Maximum concurrent member writes
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Deliver an event to every member of a snapshot
    ///
    /// Returns once every write has finished or hit its deadline. A failed
    /// member is not unregistered here; its own read loop does that.
    pub async fn deliver(
        &self,
        room: &str,
        event: &Event,
        members: &[Arc<ConnectionHandle>],
    ) -> DeliveryReport {
        if members.is_empty() {
            return DeliveryReport::empty(room);
        }

        let json = match event.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(room = %room, kind = %event.kind, error = %e, "Failed to encode event");
                return DeliveryReport {
                    attempted: members.len(),
                    failed: members.len(),
                    ..DeliveryReport::empty(room)
                };
            }
        };

        let writes: Vec<_> = members
            .iter()
            .map(|member| {
                let json = json.clone();
                let member = Arc::clone(member);
                async move {
                    match member.send_text(json).await {
                        Ok(()) => true,
                        Err(e) => {
                            tracing::warn!(
                                room = %room,
                                connection_id = %member.id(),
                                error = %e,
                                "Failed to deliver event"
                            );
                            false
                        }
                    }
                }
            })
            .collect();

        let delivered = stream::iter(writes)
            .buffer_unordered(self.concurrency)
            .filter(|ok| futures_util::future::ready(*ok))
            .count()
            .await;

        let report = DeliveryReport {
            room: room.to_string(),
            attempted: members.len(),
            delivered,
            failed: members.len() - delivered,
        };

        tracing::trace!(
            room = %room,
            kind = %event.kind,
            delivered = report.delivered,
            failed = report.failed,
            "Event dispatched to room"
        );

        report
    }
}

impl Default for BroadcastDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_FANOUT_CONCURRENCY)
    }
}
