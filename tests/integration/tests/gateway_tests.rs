//! Gateway Integration Tests
//!
//! Most tests feed the relay from an in-memory bus and need nothing running.
//! The Redis round trip requires:
//! - Running Redis instance
//! - Environment variable: REDIS_URL
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use std::time::Duration;

use integration_tests::{
    assert_json, assert_text, chat_message, check_test_env, new_post, test_config, unique_room,
    update_post_likes, wait_until, TestServer,
};
use relay_bus::{Publisher, RedisPool, Topic};
use relay_common::RelayError;
use relay_gateway::server::create_gateway_state;
use reqwest::StatusCode;
use serde_json::Value;

const SILENCE: Duration = Duration::from_millis(200);

// ============================================================================
// Operational Endpoints
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health").await.expect("Request failed");
    let body = assert_text(response, StatusCode::OK).await.unwrap();
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_stats_reports_rooms() {
    let server = TestServer::start().await.expect("Failed to start server");
    let _a = server.join("r1").await.unwrap();
    let _b = server.join("r1").await.unwrap();
    let _c = server.join("feed").await.unwrap();

    let response = server.get("/stats").await.unwrap();
    let stats: Value = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(stats["rooms"], 2);
    assert_eq!(stats["connections"], 3);
    assert_eq!(stats["members"]["r1"], 2);
    assert_eq!(stats["members"]["feed"], 1);
    assert_eq!(stats["bridge"]["received"], 0);
}

// ============================================================================
// Join Handshake
// ============================================================================

#[tokio::test]
async fn test_join_registers_connection() {
    let server = TestServer::start().await.expect("Failed to start server");
    let room = unique_room();

    let _client = server.join(&room).await.unwrap();

    assert_eq!(server.state.registry().member_count(&room), 1);
    assert_eq!(server.state.registry().connection_count(), 1);
}

#[tokio::test]
async fn test_invalid_join_is_closed_without_registering() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut client = server.connect().await.unwrap();

    client.send_text("lobby").await.unwrap();

    assert_eq!(client.close_code().await.unwrap(), Some(4002));
    assert_eq!(server.state.registry().connection_count(), 0);
    assert_eq!(server.state.registry().room_count(), 0);
}

#[tokio::test]
async fn test_join_timeout_closes_connection() {
    let mut config = test_config().unwrap();
    config.keepalive.join_timeout = Duration::from_millis(100);
    let server = TestServer::start_with_config(config).await.unwrap();

    let mut client = server.connect().await.unwrap();

    assert_eq!(client.close_code().await.unwrap(), Some(4009));
    assert_eq!(server.state.registry().connection_count(), 0);
}

#[tokio::test]
async fn test_join_without_room_uses_default_room() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut client = server.connect().await.unwrap();

    client.send_text("{}").await.unwrap();
    server.wait_for_members("", 1).await.unwrap();

    server.publish(Topic::Chat, chat_message("", "to everyone")).unwrap();
    assert_eq!(client.next_event().await.unwrap()["content"], "to everyone");
}

// ============================================================================
// Broadcast
// ============================================================================

#[tokio::test]
async fn test_broadcast_reaches_only_room_members() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut a = server.join("r1").await.unwrap();
    let mut b = server.join("r1").await.unwrap();
    let mut c = server.join("r2").await.unwrap();

    server.publish(Topic::Chat, chat_message("r1", "hi")).unwrap();

    for client in [&mut a, &mut b] {
        let event = client.next_event().await.unwrap();
        assert_eq!(event["type"], "message");
        assert_eq!(event["room"], "r1");
        assert_eq!(event["content"], "hi");
        assert_eq!(event["sender_id"], 42);
        assert!(event.get("post_id").is_none());
        assert!(event.get("likes").is_none());
    }
    c.expect_silence(SILENCE).await.unwrap();
}

#[tokio::test]
async fn test_feed_events_go_to_feed_room() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut feed = server.join("feed").await.unwrap();
    let mut lobby = server.join("lobby").await.unwrap();

    server.publish(Topic::Post, new_post(7, "lobby")).unwrap();
    server.publish(Topic::Post, update_post_likes(7, 3)).unwrap();

    let first = feed.next_event().await.unwrap();
    assert_eq!(first["type"], "new_post");
    assert_eq!(first["post_id"], 7);
    assert_eq!(first["post"]["title"], "hello");

    let second = feed.next_event().await.unwrap();
    assert_eq!(second["type"], "update_post_likes");
    assert_eq!(second["likes"], 3);

    lobby.expect_silence(SILENCE).await.unwrap();
}

#[tokio::test]
async fn test_malformed_bus_message_does_not_block_next() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut client = server.join("r1").await.unwrap();

    server.publish(Topic::Chat, "{not json").unwrap();
    server.publish(Topic::Chat, chat_message("r1", "after")).unwrap();

    assert_eq!(client.next_event().await.unwrap()["content"], "after");

    let stats = server.state.bridge().stats();
    assert_eq!(stats.received, 2);
    assert_eq!(stats.dropped, 1);
}

#[tokio::test]
async fn test_events_arrive_in_bus_order() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut client = server.join("r1").await.unwrap();

    for i in 0..25 {
        server
            .publish(Topic::Chat, chat_message("r1", &format!("m{i}")))
            .unwrap();
    }

    for i in 0..25 {
        let event = client.next_event().await.unwrap();
        assert_eq!(event["content"], format!("m{i}"));
    }
}

// ============================================================================
// Teardown
// ============================================================================

#[tokio::test]
async fn test_client_close_unregisters() {
    let server = TestServer::start().await.expect("Failed to start server");
    let room = unique_room();
    let stays = server.join(&room).await.unwrap();
    let leaves = server.join(&room).await.unwrap();

    leaves.close().await.unwrap();
    server.wait_for_members(&room, 1).await.unwrap();

    stays.close().await.unwrap();
    server.wait_for_members(&room, 0).await.unwrap();
    assert!(!server.state.registry().has_room(&room));
}

#[tokio::test]
async fn test_dropped_client_unregisters() {
    let server = TestServer::start().await.expect("Failed to start server");
    let room = unique_room();
    let client = server.join(&room).await.unwrap();

    drop(client);

    server.wait_for_members(&room, 0).await.unwrap();
}

#[tokio::test]
async fn test_oversized_frame_drops_connection() {
    let server = TestServer::start().await.expect("Failed to start server");
    let room = unique_room();
    let mut client = server.join(&room).await.unwrap();

    client.send_text("x".repeat(2048)).await.unwrap();

    server.wait_for_members(&room, 0).await.unwrap();
}

#[tokio::test]
async fn test_bus_end_stops_server() {
    let server = TestServer::start().await.expect("Failed to start server");

    let result = server.end_bus().await.unwrap();

    assert!(matches!(result, Err(RelayError::SubscriptionClosed)));
}

// ============================================================================
// Redis
// ============================================================================

#[tokio::test]
async fn test_redis_round_trip() {
    if !check_test_env().await {
        return;
    }

    let config = test_config().unwrap();
    let pool = RedisPool::from_config(&config.redis).expect("Failed to create pool");
    let publisher = Publisher::new(pool);

    let (state, subscription) = create_gateway_state(config)
        .await
        .expect("Failed to subscribe");
    let server = TestServer::start_with_subscription(state, subscription, None)
        .await
        .unwrap();

    let room = unique_room();
    let mut client = server.join(&room).await.unwrap();

    let payload = chat_message(&room, "via redis");
    publisher
        .publish_raw(&Topic::Chat, &payload)
        .await
        .expect("Failed to publish");

    let event = client.next_event().await.unwrap();
    assert_eq!(event["room"], room.as_str());
    assert_eq!(event["content"], "via redis");

    wait_until(|| server.state.bridge().stats().delivered == 1)
        .await
        .unwrap();

    let response = server.get("/stats").await.unwrap();
    let stats: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(stats["members"][room.as_str()], 1);
}
