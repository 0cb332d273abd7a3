//! Relay configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main relay configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    pub app: AppSettings,
    pub gateway: GatewayConfig,
    pub redis: RedisConfig,
    pub keepalive: KeepaliveConfig,
    pub bridge: BridgeConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// WebSocket gateway listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Route serving the WebSocket upgrade
    #[serde(default = "default_path")]
    pub path: String,
}

impl GatewayConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
}

/// Per-connection timing and framing limits
#[derive(Debug, Clone, Deserialize)]
pub struct KeepaliveConfig {
    /// Deadline for a single frame write
    pub write_wait: Duration,
    /// Read idle deadline, reset by every pong
    pub pong_wait: Duration,
    /// Window for the client's join request
    pub join_timeout: Duration,
    /// Largest inbound frame accepted, in bytes
    pub max_message_size: usize,
}

impl KeepaliveConfig {
    /// Ping period, always shorter than `pong_wait`
    #[must_use]
    pub fn ping_period(&self) -> Duration {
        self.pong_wait * 8 / 10
    }
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            write_wait: Duration::from_secs(default_write_wait_secs()),
            pong_wait: Duration::from_secs(default_pong_wait_secs()),
            join_timeout: Duration::from_secs(default_join_timeout_secs()),
            max_message_size: default_max_message_size(),
        }
    }
}

/// Bus bridge and fan-out settings
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// Concurrent writes per broadcast
    #[serde(default = "default_fanout_concurrency")]
    pub fanout_concurrency: usize,
    /// Re-publish client frames to the chat topic
    #[serde(default)]
    pub client_publish: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            fanout_concurrency: default_fanout_concurrency(),
            client_publish: false,
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "room-relay".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_path() -> String {
    "/ws".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_write_wait_secs() -> u64 {
    20
}

fn default_pong_wait_secs() -> u64 {
    90
}

fn default_join_timeout_secs() -> u64 {
    10
}

fn default_max_message_size() -> usize {
    512
}

fn default_fanout_concurrency() -> usize {
    64
}

impl RelayConfig {
    /// Load configuration from environment variables
    ///
    /// Every variable is optional; unparseable values are rejected.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = match lookup("APP_ENV") {
            Some(value) => Environment::parse(&value)
                .ok_or(ConfigError::InvalidValue("APP_ENV", value))?,
            None => Environment::default(),
        };

        let keepalive = KeepaliveConfig {
            write_wait: Duration::from_secs(parse_or(
                &lookup,
                "WRITE_WAIT_SECS",
                default_write_wait_secs(),
            )?),
            pong_wait: Duration::from_secs(parse_or(
                &lookup,
                "PONG_WAIT_SECS",
                default_pong_wait_secs(),
            )?),
            join_timeout: Duration::from_secs(parse_or(
                &lookup,
                "JOIN_TIMEOUT_SECS",
                default_join_timeout_secs(),
            )?),
            max_message_size: parse_or(&lookup, "MAX_MESSAGE_SIZE", default_max_message_size())?,
        };

        if keepalive.pong_wait.is_zero() {
            return Err(ConfigError::InvalidValue("PONG_WAIT_SECS", "0".to_string()));
        }

        let bridge = BridgeConfig {
            fanout_concurrency: parse_or(
                &lookup,
                "FANOUT_CONCURRENCY",
                default_fanout_concurrency(),
            )?,
            client_publish: parse_or(&lookup, "CLIENT_PUBLISH", false)?,
        };

        if bridge.fanout_concurrency == 0 {
            return Err(ConfigError::InvalidValue("FANOUT_CONCURRENCY", "0".to_string()));
        }

        let path = lookup("GATEWAY_PATH").unwrap_or_else(default_path);
        if !path.starts_with('/') || RESERVED_PATHS.contains(&path.as_str()) {
            return Err(ConfigError::InvalidValue("GATEWAY_PATH", path));
        }

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env,
            },
            gateway: GatewayConfig {
                host: lookup("GATEWAY_HOST").unwrap_or_else(default_host),
                port: parse_or(&lookup, "GATEWAY_PORT", default_port())?,
                path,
            },
            redis: RedisConfig {
                url: lookup("REDIS_URL").unwrap_or_else(default_redis_url),
                max_connections: parse_or(
                    &lookup,
                    "REDIS_MAX_CONNECTIONS",
                    default_redis_max_connections(),
                )?,
            },
            keepalive,
            bridge,
        })
    }
}

/// Routes served next to the WebSocket endpoint
const RESERVED_PATHS: [&str; 2] = ["/health", "/stats"];

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
