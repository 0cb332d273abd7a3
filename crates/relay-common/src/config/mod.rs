//! Configuration structs

mod relay_config;

pub use relay_config::{
    AppSettings, BridgeConfig, ConfigError, Environment, GatewayConfig, KeepaliveConfig,
    RedisConfig, RelayConfig,
};
