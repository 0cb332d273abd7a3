//! Test helpers for integration tests
//!
//! Provides utilities for spawning a relay on an ephemeral port, feeding its
//! bus from the test, and driving WebSocket clients against it.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::channel::mpsc;
use futures_util::{SinkExt, StreamExt};
use relay_bus::{BusMessage, Subscription, Topic};
use relay_common::{RelayConfig, RelayResult};
use relay_gateway::server::{serve, GatewayState};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// How long a test waits for any single expected frame or state change
pub const WAIT: Duration = Duration::from_secs(5);

/// Relay instance fed by an in-memory bus
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub state: GatewayState,
    bus: Option<mpsc::UnboundedSender<BusMessage>>,
    handle: JoinHandle<RelayResult<()>>,
}

impl TestServer {
    /// Start a new test server with default settings
    pub async fn start() -> Result<Self> {
        Self::start_with_config(test_config()?).await
    }

    /// Start a test server with custom config
    pub async fn start_with_config(config: RelayConfig) -> Result<Self> {
        let (bus, messages) = mpsc::unbounded();
        let subscription = Subscription::from_stream(Topic::consumed().to_vec(), messages);
        let state = GatewayState::new(config, None);
        Self::start_with_subscription(state, subscription, Some(bus)).await
    }

    /// Start a test server over an existing subscription
    pub async fn start_with_subscription(
        state: GatewayState,
        subscription: Subscription,
        bus: Option<mpsc::UnboundedSender<BusMessage>>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(serve(listener, state.clone(), subscription));

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            state,
            bus,
            handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the WebSocket URL for the server
    pub fn ws_url(&self) -> String {
        format!("ws://{}{}", self.addr, self.state.config().gateway.path)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Push a raw payload onto the in-memory bus
    pub fn publish(&self, topic: Topic, payload: impl Into<String>) -> Result<()> {
        let bus = self.bus.as_ref().context("server has no in-memory bus")?;
        bus.unbounded_send(BusMessage::new(topic, payload))
            .context("bus receiver dropped")
    }

    /// Open a WebSocket without joining
    pub async fn connect(&self) -> Result<WsClient> {
        WsClient::connect(&self.ws_url()).await
    }

    /// Open a WebSocket and join `room`, waiting until the relay registered it
    pub async fn join(&self, room: &str) -> Result<WsClient> {
        let before = self.state.registry().member_count(room);
        let mut client = self.connect().await?;
        client.send_join(room).await?;
        self.wait_for_members(room, before + 1).await?;
        Ok(client)
    }

    /// Wait until `room` has exactly `count` members
    pub async fn wait_for_members(&self, room: &str, count: usize) -> Result<()> {
        let registry = self.state.registry().clone();
        wait_until(|| registry.member_count(room) == count)
            .await
            .with_context(|| {
                format!(
                    "room {room:?} has {} members, expected {count}",
                    registry.member_count(room)
                )
            })
    }

    /// End the bus stream and return what the server did about it
    pub async fn end_bus(mut self) -> Result<RelayResult<()>> {
        self.bus.take();
        Ok(tokio::time::timeout(WAIT, self.handle).await??)
    }
}

/// Poll `condition` until it holds or `WAIT` elapses
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> Result<()> {
    tokio::time::timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .context("condition not met in time")
}

/// WebSocket client speaking the relay protocol
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Connect to a relay endpoint
    pub async fn connect(url: &str) -> Result<Self> {
        let (stream, _) = connect_async(url).await?;
        Ok(Self { stream })
    }

    /// Send the join request
    pub async fn send_join(&mut self, room: &str) -> Result<()> {
        self.send_text(serde_json::json!({ "room": room }).to_string())
            .await
    }

    /// Send a text frame
    pub async fn send_text(&mut self, text: impl Into<String>) -> Result<()> {
        self.stream.send(Message::Text(text.into())).await?;
        Ok(())
    }

    /// Next data or close frame, skipping pings and pongs
    pub async fn next_frame(&mut self) -> Result<Option<Message>> {
        tokio::time::timeout(WAIT, async {
            loop {
                match self.stream.next().await {
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Ok(frame)) => return Ok(Some(frame)),
                    Some(Err(e)) => return Err(anyhow::Error::from(e)),
                    None => return Ok(None),
                }
            }
        })
        .await
        .context("no frame in time")?
    }

    /// Next text frame, parsed as JSON
    pub async fn next_event(&mut self) -> Result<Value> {
        match self.next_frame().await? {
            Some(Message::Text(text)) => Ok(serde_json::from_str(&text)?),
            other => anyhow::bail!("expected text frame, got {other:?}"),
        }
    }

    /// Assert nothing arrives within `window`
    pub async fn expect_silence(&mut self, window: Duration) -> Result<()> {
        match tokio::time::timeout(window, self.stream.next()).await {
            Err(_) => Ok(()),
            Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => Ok(()),
            Ok(frame) => anyhow::bail!("expected silence, got {frame:?}"),
        }
    }

    /// Wait for the server's close frame and return its code
    pub async fn close_code(&mut self) -> Result<Option<u16>> {
        match self.next_frame().await? {
            Some(Message::Close(frame)) => Ok(frame.map(|f| u16::from(f.code))),
            None => Ok(None),
            other => anyhow::bail!("expected close frame, got {other:?}"),
        }
    }

    /// Close the connection from the client side
    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}

/// Create a test configuration
///
/// Reads the environment like the binary does, but always binds locally.
pub fn test_config() -> Result<RelayConfig> {
    dotenvy::dotenv().ok();

    let mut config =
        RelayConfig::from_env().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;
    config.gateway.host = "127.0.0.1".to_string();
    config.gateway.port = 0;

    Ok(config)
}

/// Helper to check if a Redis instance is configured
pub async fn check_test_env() -> bool {
    if std::env::var("REDIS_URL").is_err() {
        eprintln!("Skipping test: REDIS_URL not set");
        return false;
    }

    true
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(
    response: Response,
    expected_status: StatusCode,
) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(response.json().await?)
}

/// Assert response status and return the body text
pub async fn assert_text(response: Response, expected_status: StatusCode) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;
    if status != expected_status {
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(body)
}
