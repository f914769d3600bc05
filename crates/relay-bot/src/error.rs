//! Application-wide error types using thiserror.

use relay_commands::StoreError;
use relay_common::ServiceError;
use relay_gateway::GatewayError;

/// Main application error type.
#[derive(thiserror::Error, Debug)]
pub enum BotError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ServiceError),

    /// The cooldown store could not be opened.
    #[error("Cooldown store error: {0}")]
    Store(#[from] StoreError),

    /// The gateway client could not be built.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// HTTP server failure.
    #[error("Server error: {0}")]
    Server(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the bot application.
pub type BotResult<T> = Result<T, BotError>;
