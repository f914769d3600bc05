//! Agent lifecycle driven on startup and shutdown.
//!
//! Every step is attempted once and logged. A failing step never stops the
//! following ones; the webhook keeps serving either way.

use relay_config::Config;
use relay_gateway::{ActionGateway, ActionRequest, AgentControl, GatewayError};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Loads, starts and stops the agent and manages the platform webhook.
pub struct AgentLifecycle {
    control: Arc<dyn AgentControl>,
    gateway: Arc<dyn ActionGateway>,
    enabled: bool,
    agent_name: String,
    status_connections: Vec<String>,
    chat_connection: String,
    public_url: Option<String>,
    secret: String,
    allowed_updates: Vec<String>,
}

impl std::fmt::Debug for AgentLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentLifecycle")
            .field("enabled", &self.enabled)
            .field("agent_name", &self.agent_name)
            .field("public_url", &self.public_url)
            .finish_non_exhaustive()
    }
}

impl AgentLifecycle {
    /// Creates the lifecycle for `config`, registering `secret` with the webhook.
    pub fn new(
        config: &Config,
        secret: impl Into<String>,
        control: Arc<dyn AgentControl>,
        gateway: Arc<dyn ActionGateway>,
    ) -> Self {
        Self {
            control,
            gateway,
            enabled: config.agent.manage_lifecycle,
            agent_name: config.agent.name.clone(),
            status_connections: config.agent.status_connections.clone(),
            chat_connection: config.gateway.chat_connection.clone(),
            public_url: config.webhook.public_url.clone(),
            secret: secret.into(),
            allowed_updates: config.webhook.allowed_updates.clone(),
        }
    }

    /// Load agent, report connection status, register the webhook, start agent.
    pub async fn startup(&self) {
        if !self.enabled {
            info!("Agent lifecycle management disabled, skipping startup steps");
            return;
        }

        log_step("load agent", self.control.load_agent(&self.agent_name).await);

        for connection in &self.status_connections {
            match self.control.connection_status(connection).await {
                Ok(status) => info!(%connection, %status, "Connection status"),
                Err(e) => error!(%connection, "Failed to query connection status: {}", e),
            }
        }

        match &self.public_url {
            Some(url) => {
                self.run_action(ActionRequest::set_webhook(
                    &self.chat_connection,
                    url,
                    &self.secret,
                    &self.allowed_updates,
                ))
                .await;
            }
            None => info!("No public URL configured, webhook registration skipped"),
        }

        log_step("start agent", self.control.start_agent().await);
    }

    /// Stop agent, then remove the webhook.
    pub async fn shutdown(&self) {
        if !self.enabled {
            return;
        }

        log_step("stop agent", self.control.stop_agent().await);
        self.run_action(ActionRequest::delete_webhook(&self.chat_connection))
            .await;
    }

    async fn run_action(&self, request: ActionRequest) {
        match self.gateway.execute(&request).await {
            Ok(response) if response.is_success() => {
                info!(action = %request.action, "Action completed");
            }
            Ok(response) => warn!(
                action = %request.action,
                status = %response.status,
                "Action was not confirmed"
            ),
            Err(e) => error!(action = %request.action, "Action failed: {}", e),
        }
    }
}

fn log_step(step: &str, result: Result<serde_json::Value, GatewayError>) {
    match result {
        Ok(response) => info!(%response, "{} succeeded", step),
        Err(e) => error!("Failed to {}: {}", step, e),
    }
}
