//! Default values.

use crate::schema::*;
use std::path::PathBuf;

/// Lifetime of a cooldown record: half a day.
pub const DEFAULT_COOLDOWN_TTL_SECS: u64 = 43_200;

/// Default store key prefix for cooldown records.
pub const DEFAULT_KEY_PREFIX: &str = "telegram_user:";

/// Default command prefix that triggers a reading.
pub const DEFAULT_READING_PREFIX: &str = "/tarot";

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            webhook_path: "/api/telegram/hook".to_string(),
            shutdown_grace_secs: 30,
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            public_url: None,
            secret: None,
            allowed_updates: vec!["message".to_string()],
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 300,
            chat_connection: "telegram".to_string(),
            reading_connection: "tarot-reader".to_string(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "tarot-reader".to_string(),
            manage_lifecycle: true,
            status_connections: vec!["goat".to_string(), "telegram".to_string()],
        }
    }
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_COOLDOWN_TTL_SECS,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            backend: StoreBackend::Memory,
            sled_path: PathBuf::from("data/cooldowns"),
            sweep_interval_secs: 600,
        }
    }
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            reading_prefix: DEFAULT_READING_PREFIX.to_string(),
        }
    }
}
