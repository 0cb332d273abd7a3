//! Redis Pub/Sub module.
//!
//! Topic naming, the consuming subscription, and the publisher.

mod publisher;
mod subscriber;
mod topics;

pub use publisher::Publisher;
pub use subscriber::{
    BusMessage, SubscriberBuilder, SubscriberError, SubscriberResult, Subscription,
};
pub use topics::{Topic, CHAT_TOPIC, POST_TOPIC};
