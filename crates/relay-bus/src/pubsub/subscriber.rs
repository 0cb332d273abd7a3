//! Redis Pub/Sub subscriber.
//!
//! Subscribes to a fixed set of topics once and exposes the incoming messages
//! as an ordered stream. There is no resubscription: when the underlying
//! connection drops the stream ends and the consumer decides what to do.

use crate::pool::redact_url;
use crate::pubsub::Topic;
use futures_util::{Stream, StreamExt};
use redis::Client;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Error type for subscriber operations
#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("No topics to subscribe to")]
    NoTopics,
}

/// Result type for subscriber operations
pub type SubscriberResult<T> = Result<T, SubscriberError>;

/// Raw message received from the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    /// Topic the message was received on
    pub topic: Topic,
    /// Raw payload, undecoded
    pub payload: String,
}

impl BusMessage {
    /// Create a message for a topic
    #[must_use]
    pub fn new(topic: Topic, payload: impl Into<String>) -> Self {
        Self {
            topic,
            payload: payload.into(),
        }
    }

    /// Create from raw Redis message
    ///
    /// Invalid UTF-8 is replaced rather than rejected; decoding the payload is
    /// the consumer's job.
    fn from_redis(msg: &redis::Msg) -> Self {
        Self {
            topic: Topic::parse(msg.get_channel_name()),
            payload: String::from_utf8_lossy(msg.get_payload_bytes()).into_owned(),
        }
    }
}

/// An open subscription: an unbounded, ordered stream of bus messages
pub struct Subscription {
    topics: Vec<Topic>,
    inner: Pin<Box<dyn Stream<Item = BusMessage> + Send>>,
}

impl Subscription {
    /// Wrap any message stream as a subscription
    ///
    /// Used by the Redis builder and by in-process buses.
    pub fn from_stream<S>(topics: Vec<Topic>, stream: S) -> Self
    where
        S: Stream<Item = BusMessage> + Send + 'static,
    {
        Self {
            topics,
            inner: Box::pin(stream),
        }
    }

    /// Topics this subscription listens on
    #[must_use]
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }
}

impl Stream for Subscription {
    type Item = BusMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("topics", &self.topics)
            .finish()
    }
}

/// Builder for a Redis subscription
pub struct SubscriberBuilder {
    redis_url: String,
    topics: Vec<Topic>,
}

impl SubscriberBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            topics: Vec::new(),
        }
    }

    /// Set Redis URL
    #[must_use]
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = url.into();
        self
    }

    /// Add a topic
    #[must_use]
    pub fn subscribe(mut self, topic: Topic) -> Self {
        if !self.topics.contains(&topic) {
            self.topics.push(topic);
        }
        self
    }

    /// Add several topics
    #[must_use]
    pub fn subscribe_all(self, topics: impl IntoIterator<Item = Topic>) -> Self {
        topics.into_iter().fold(self, Self::subscribe)
    }

    /// Connect, subscribe to every topic, and return the message stream
    ///
    /// Any failure here means the relay has no broadcast capability.
    pub async fn build(self) -> SubscriberResult<Subscription> {
        if self.topics.is_empty() {
            return Err(SubscriberError::NoTopics);
        }

        let client = Client::open(self.redis_url.as_str())?;
        let mut pubsub = client.get_async_pubsub().await?;

        for topic in &self.topics {
            pubsub.subscribe(topic.name()).await?;
            tracing::info!(topic = %topic, "Subscribed to topic");
        }

        tracing::info!(
            url = %redact_url(&self.redis_url),
            topics = self.topics.len(),
            "Subscriber connected to Redis"
        );

        let stream = pubsub.into_on_message().map(|msg| {
            let received = BusMessage::from_redis(&msg);
            tracing::trace!(topic = %received.topic, "Received Pub/Sub message");
            received
        });

        Ok(Subscription::from_stream(self.topics, stream))
    }
}

impl Default for SubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}
