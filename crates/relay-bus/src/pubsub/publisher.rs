//! Redis Pub/Sub publisher.
//!
//! Publishes serialized messages to a topic. The relay itself only publishes
//! on behalf of clients; other services use the same contract to feed it.

use crate::pool::{RedisPool, RedisResult};
use crate::pubsub::Topic;
use redis::AsyncCommands;
use serde::Serialize;

/// Redis Pub/Sub publisher
#[derive(Clone, Debug)]
pub struct Publisher {
    pool: RedisPool,
}

impl Publisher {
    /// Create a new publisher
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Serialize a message as JSON and publish it to a topic
    ///
    /// Returns the number of subscribers that received it.
    pub async fn publish<T: Serialize>(&self, topic: &Topic, message: &T) -> RedisResult<u32> {
        let payload = serde_json::to_string(message)?;
        self.publish_raw(topic, &payload).await
    }

    /// Publish a raw message to a topic
    pub async fn publish_raw(&self, topic: &Topic, message: &str) -> RedisResult<u32> {
        let mut conn = self.pool.get().await?;

        let receivers: u32 = conn.publish(topic.name(), message).await?;

        tracing::debug!(
            topic = %topic,
            receivers = receivers,
            "Published message"
        );

        Ok(receivers)
    }
}
