//! Configuration schema definitions using serde.
//!
//! Every section carries `#[serde(default)]`, so a configuration file only
//! needs the values it changes.

use relay_common::{LoggingConfig, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for the relay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Webhook HTTP server configuration.
    pub server: ServerConfig,
    /// Webhook registration configuration.
    pub webhook: WebhookConfig,
    /// Action gateway configuration.
    pub gateway: GatewayConfig,
    /// Agent lifecycle configuration.
    pub agent: AgentConfig,
    /// Cooldown store configuration.
    pub cooldown: CooldownConfig,
    /// Command recognition configuration.
    pub commands: CommandsConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Webhook HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Route that receives platform updates.
    pub webhook_path: String,
    /// How long shutdown waits for in-flight readings, in seconds.
    pub shutdown_grace_secs: u64,
}

/// Webhook registration configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Public URL the platform should deliver updates to. Registration is
    /// skipped when unset.
    pub public_url: Option<String>,
    /// Shared secret expected in the secret-token header. Generated per
    /// process when unset.
    pub secret: Option<String>,
    /// Update types requested from the platform.
    pub allowed_updates: Vec<String>,
}

/// Action gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL of the agent HTTP service.
    pub base_url: String,
    /// Per-call timeout in seconds. Readings are slow, so this is generous.
    pub timeout_secs: u64,
    /// Connection used for chat messages.
    pub chat_connection: String,
    /// Connection that performs readings.
    pub reading_connection: String,
}

/// Agent lifecycle configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Agent loaded on startup.
    pub name: String,
    /// Whether startup and shutdown drive the agent (load, webhook, start, stop).
    pub manage_lifecycle: bool,
    /// Connections whose status is reported on startup.
    pub status_connections: Vec<String>,
}

/// Storage backend for cooldown records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local map; records are lost on restart.
    #[default]
    Memory,
    /// Embedded sled database; records survive restarts.
    Sled,
}

/// Cooldown store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    /// Lifetime of a cooldown record in seconds.
    pub ttl_secs: u64,
    /// Prefix of the store key; the requester id is appended.
    pub key_prefix: String,
    /// Storage backend.
    pub backend: StoreBackend,
    /// Database directory for the sled backend.
    pub sled_path: PathBuf,
    /// Interval between expired-record sweeps in seconds.
    pub sweep_interval_secs: u64,
}

/// Command recognition configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    /// Commands starting with this prefix trigger a reading.
    pub reading_prefix: String,
}

impl Config {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        crate::validator::ConfigValidator::validate(self)
    }
}

impl ServerConfig {
    /// Socket address string to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Grace period for in-flight readings on shutdown.
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl WebhookConfig {
    /// Returns the configured secret, or a freshly generated one.
    pub fn resolve_secret(&self) -> String {
        self.secret.clone().unwrap_or_else(generate_secret)
    }
}

impl GatewayConfig {
    /// Per-call timeout.
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CooldownConfig {
    /// Lifetime of a cooldown record.
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Interval between expired-record sweeps.
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Generates a 64 character hex secret.
pub fn generate_secret() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}
