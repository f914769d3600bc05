//! Errors raised while loading, saving and checking relay configuration.

use thiserror::Error;

/// Result alias over [`ServiceError`]
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Error type for configuration loading, persistence and validation
#[derive(Error, Debug)]
pub enum ServiceError {
    /// A configuration file or override could not be read, parsed or written
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON rendering or parsing failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration value is out of range, tagged with its dotted field path
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },
}

impl ServiceError {
    /// Configuration error without an underlying cause
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Configuration error wrapping its cause
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Validation error for `field`, e.g. `cooldown.ttl_secs`
    pub fn validation_field(msg: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// The offending field of a validation error, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ServiceError::config("missing gateway url");
        assert_eq!(error.to_string(), "Configuration error: missing gateway url");

        let error = ServiceError::validation_field("must be positive", "cooldown.ttl_secs");
        assert_eq!(error.to_string(), "Validation error: must be positive");
        assert_eq!(error.field(), Some("cooldown.ttl_secs"));
    }

    #[test]
    fn test_error_source_is_kept() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml");
        let error = ServiceError::config_with_source("Failed to read config", io);
        assert!(error.source().is_some());
        assert_eq!(error.field(), None);
    }

    #[test]
    fn test_serde_json_errors_convert() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: ServiceError = parse.into();
        assert!(matches!(error, ServiceError::Serialization(_)));
    }
}
