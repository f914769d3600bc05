//! Trait seams between the relay and the agent service.

use crate::error::GatewayError;
use crate::types::{ActionRequest, ActionResponse};
use async_trait::async_trait;

/// Executes named actions on the agent service.
#[async_trait]
pub trait ActionGateway: Send + Sync {
    /// Executes one action and returns the gateway's response.
    ///
    /// A response with a non-success `status` is still `Ok`; interpreting it
    /// is up to the caller.
    async fn execute(&self, request: &ActionRequest) -> Result<ActionResponse, GatewayError>;
}

/// Agent lifecycle operations used on startup and shutdown.
#[async_trait]
pub trait AgentControl: Send + Sync {
    /// Loads the named agent.
    async fn load_agent(&self, name: &str) -> Result<serde_json::Value, GatewayError>;

    /// Reports the status of a connection.
    async fn connection_status(&self, connection: &str) -> Result<serde_json::Value, GatewayError>;

    /// Starts the loaded agent.
    async fn start_agent(&self) -> Result<serde_json::Value, GatewayError>;

    /// Stops the running agent.
    async fn stop_agent(&self) -> Result<serde_json::Value, GatewayError>;
}
