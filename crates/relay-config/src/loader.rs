//! Configuration loading and persistence with atomic file operations.

use crate::schema::{Config, StoreBackend};
use relay_common::{Result, ServiceError};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable overriding `server.port`.
pub const ENV_PORT: &str = "PORT";
/// Environment variable overriding `gateway.base_url`.
pub const ENV_GATEWAY_URL: &str = "RELAY_GATEWAY_URL";
/// Environment variable overriding `webhook.secret`.
pub const ENV_WEBHOOK_SECRET: &str = "RELAY_WEBHOOK_SECRET";
/// Environment variable overriding `webhook.public_url`.
pub const ENV_WEBHOOK_URL: &str = "RELAY_WEBHOOK_URL";
/// Environment variable overriding `cooldown.ttl_secs`.
pub const ENV_COOLDOWN_TTL: &str = "RELAY_COOLDOWN_TTL_SECS";
/// Environment variable overriding `cooldown.backend`.
pub const ENV_COOLDOWN_BACKEND: &str = "RELAY_COOLDOWN_BACKEND";

/// On-disk configuration format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.yaml` / `.yml`
    Yaml,
    /// `.json`
    Json,
}

impl ConfigFormat {
    /// Detects the format of a configuration file from its extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => Err(ServiceError::config(format!(
                "Unsupported configuration file '{}': expected .toml, .yaml, .yml or .json",
                path.display()
            ))),
        }
    }

    /// Parses configuration text in this format.
    pub fn parse(self, contents: &str) -> Result<Config> {
        match self {
            Self::Toml => toml::from_str(contents)
                .map_err(|e| ServiceError::config_with_source("Invalid TOML configuration", e)),
            Self::Yaml => serde_yaml::from_str(contents)
                .map_err(|e| ServiceError::config_with_source("Invalid YAML configuration", e)),
            Self::Json => serde_json::from_str(contents)
                .map_err(|e| ServiceError::config_with_source("Invalid JSON configuration", e)),
        }
    }

    /// Serializes a configuration in this format.
    pub fn render(self, config: &Config) -> Result<String> {
        match self {
            Self::Toml => toml::to_string_pretty(config)
                .map_err(|e| ServiceError::config_with_source("Failed to render TOML", e)),
            Self::Yaml => serde_yaml::to_string(config)
                .map_err(|e| ServiceError::config_with_source("Failed to render YAML", e)),
            Self::Json => Ok(serde_json::to_string_pretty(config)?),
        }
    }
}

/// Configuration loader with atomic file operations.
pub struct ConfigLoader {
    path: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads configuration from file.
    pub async fn load(&self) -> Result<Config> {
        let format = ConfigFormat::from_path(&self.path)?;
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ServiceError::config_with_source(
                format!("Failed to read configuration '{}'", self.path.display()),
                e,
            )
        })?;

        let config = format.parse(&contents)?;
        info!("Loaded configuration from {}", self.path.display());
        Ok(config)
    }

    /// Saves configuration to file atomically.
    ///
    /// The file is written next to the target and renamed over it, so readers
    /// never observe a partial file.
    pub async fn save(&self, config: &Config) -> Result<()> {
        let format = ConfigFormat::from_path(&self.path)?;
        let rendered = format.render(config)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomically(&path, rendered.as_bytes()))
            .await
            .map_err(|e| ServiceError::config_with_source("Configuration writer panicked", e))??;

        debug!("Saved configuration to {}", self.path.display());
        Ok(())
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&directory)?;

    let mut file = tempfile::NamedTempFile::new_in(&directory)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| ServiceError::Io(e.error))?;
    Ok(())
}

/// Applies overrides from the process environment.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Applies overrides from an arbitrary variable lookup.
pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup(ENV_PORT) {
        config.server.port = port.parse().map_err(|e| {
            ServiceError::config_with_source(format!("{ENV_PORT} must be a port number"), e)
        })?;
    }
    if let Some(url) = lookup(ENV_GATEWAY_URL) {
        config.gateway.base_url = url;
    }
    if let Some(secret) = lookup(ENV_WEBHOOK_SECRET) {
        config.webhook.secret = Some(secret);
    }
    if let Some(url) = lookup(ENV_WEBHOOK_URL) {
        config.webhook.public_url = Some(url);
    }
    if let Some(ttl) = lookup(ENV_COOLDOWN_TTL) {
        config.cooldown.ttl_secs = ttl.parse().map_err(|e| {
            ServiceError::config_with_source(format!("{ENV_COOLDOWN_TTL} must be whole seconds"), e)
        })?;
    }
    if let Some(backend) = lookup(ENV_COOLDOWN_BACKEND) {
        config.cooldown.backend = match backend.to_ascii_lowercase().as_str() {
            "memory" => StoreBackend::Memory,
            "sled" => StoreBackend::Sled,
            other => {
                return Err(ServiceError::config(format!(
                    "{ENV_COOLDOWN_BACKEND} must be 'memory' or 'sled', got '{other}'"
                )))
            }
        };
    }
    Ok(())
}
