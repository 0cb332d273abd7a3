//! # relay-bus
//!
//! Redis pub/sub plumbing for the room relay.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool, used for publishing
//! - **Topics**: The fixed set of pub/sub topics the relay consumes
//! - **Subscription**: An ordered stream of raw bus messages
//! - **Publisher**: Serializes and publishes messages to a topic
//!
//! ## Example
//!
//! ```ignore
//! use relay_bus::{Publisher, RedisPool, RedisPoolConfig, SubscriberBuilder, Topic};
//!
//! let subscription = SubscriberBuilder::new()
//!     .redis_url("redis://127.0.0.1:6379")
//!     .subscribe_all(Topic::consumed())
//!     .build()
//!     .await?;
//!
//! let publisher = Publisher::new(RedisPool::new(RedisPoolConfig::default())?);
//! publisher.publish(&Topic::Chat, &serde_json::json!({"type": "message"})).await?;
//! ```

pub mod pool;
pub mod pubsub;

// Re-export pool types
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

// Re-export pubsub types
pub use pubsub::{
    BusMessage, Publisher, SubscriberBuilder, SubscriberError, SubscriberResult, Subscription,
    Topic, CHAT_TOPIC, POST_TOPIC,
};
