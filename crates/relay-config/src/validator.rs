//! Runtime validation of loaded configuration.

use crate::schema::{Config, StoreBackend};
use relay_common::{Result, ServiceError};
use url::Url;

/// Longest secret token the platform accepts.
const MAX_SECRET_LEN: usize = 256;

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a configuration, reporting the first offending field.
    pub fn validate(config: &Config) -> Result<()> {
        if config.server.port == 0 {
            return Err(ServiceError::validation_field(
                "port must be non-zero",
                "server.port",
            ));
        }
        if !config.server.webhook_path.starts_with('/') {
            return Err(ServiceError::validation_field(
                "webhook path must start with '/'",
                "server.webhook_path",
            ));
        }

        Self::validate_http_url(&config.gateway.base_url, "gateway.base_url")?;
        if config.gateway.timeout_secs == 0 {
            return Err(ServiceError::validation_field(
                "gateway timeout must be positive",
                "gateway.timeout_secs",
            ));
        }

        if let Some(public_url) = &config.webhook.public_url {
            Self::validate_http_url(public_url, "webhook.public_url")?;
        }
        if let Some(secret) = &config.webhook.secret {
            Self::validate_secret(secret)?;
        }

        if config.cooldown.ttl_secs == 0 {
            return Err(ServiceError::validation_field(
                "cooldown TTL must be positive",
                "cooldown.ttl_secs",
            ));
        }
        if config.cooldown.sweep_interval_secs == 0 {
            return Err(ServiceError::validation_field(
                "sweep interval must be positive",
                "cooldown.sweep_interval_secs",
            ));
        }
        if config.cooldown.backend == StoreBackend::Sled
            && config.cooldown.sled_path.as_os_str().is_empty()
        {
            return Err(ServiceError::validation_field(
                "sled backend requires a database path",
                "cooldown.sled_path",
            ));
        }

        let prefix = &config.commands.reading_prefix;
        if !prefix.starts_with('/') || prefix.len() < 2 {
            return Err(ServiceError::validation_field(
                "reading prefix must be a command such as '/tarot'",
                "commands.reading_prefix",
            ));
        }

        Ok(())
    }

    fn validate_http_url(value: &str, field: &str) -> Result<()> {
        let url = Url::parse(value).map_err(|e| {
            ServiceError::validation_field(format!("'{value}' is not a valid URL: {e}"), field)
        })?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ServiceError::validation_field(
                format!("unsupported URL scheme '{scheme}'"),
                field,
            )),
        }
    }

    /// The platform only accepts `A-Z`, `a-z`, `0-9`, `_` and `-` in secrets.
    fn validate_secret(secret: &str) -> Result<()> {
        let valid_chars = secret
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if secret.is_empty() || secret.len() > MAX_SECRET_LEN || !valid_chars {
            return Err(ServiceError::validation_field(
                "secret must be 1-256 characters of A-Z, a-z, 0-9, '_' or '-'",
                "webhook.secret",
            ));
        }
        Ok(())
    }
}
