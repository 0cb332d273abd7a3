//! Test fixtures and data generators
//!
//! Provides bus payloads in the shapes producers publish.

use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// A room name no other test uses
pub fn unique_room() -> String {
    format!("room-{}", unique_suffix())
}

/// Chat message payload
pub fn chat_message(room: &str, content: &str) -> String {
    json!({
        "type": "message",
        "room": room,
        "content": content,
        "sender_id": 42,
        "sender_nickname": "tester",
        "timestamp": "2024-01-01T00:00:00Z",
    })
    .to_string()
}

/// Feed payload announcing a new post
pub fn new_post(post_id: i64, room: &str) -> String {
    json!({
        "type": "new_post",
        "room": room,
        "post_id": post_id,
        "post": { "id": post_id, "title": "hello" },
    })
    .to_string()
}

/// Feed payload updating a post's like count
pub fn update_post_likes(post_id: i64, likes: i64) -> String {
    json!({
        "type": "update_post_likes",
        "post_id": post_id,
        "likes": likes,
    })
    .to_string()
}
