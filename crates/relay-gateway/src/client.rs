//! HTTP client for the agent service with connection pooling.
//!
//! Calls are made once: the relay accepts at-most-once delivery of every
//! action, so nothing here retries.

use crate::error::GatewayError;
use crate::traits::{ActionGateway, AgentControl};
use crate::types::{ActionRequest, ActionResponse};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Agent service client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpActionGateway {
    client: Client,
    base_url: String,
}

impl HttpActionGateway {
    /// Creates a client for the service at `base_url` with a per-call timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let base_url = base_url.into();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::transport(base_url.clone(), e))?;

        Ok(Self { client, base_url })
    }

    /// Base URL of the agent service.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Sends a request and decodes a JSON body.
    async fn send<T>(&self, url: &str, request: RequestBuilder) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
    {
        let response = request.send().await.map_err(|e| {
            warn!("Error calling {}: {}", url, e);
            GatewayError::transport(url, e)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Gateway returned {} for {}", status, url);
            return Err(GatewayError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::transport(url, e))?;
        debug!("Response body from {}: {} bytes", url, body.len());

        serde_json::from_slice(&body).map_err(|e| GatewayError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn post_empty(&self, path: &str) -> Result<serde_json::Value, GatewayError> {
        let url = self.endpoint(path);
        let value = self
            .send(&url, self.client.post(&url).json(&serde_json::json!({})))
            .await?;
        info!("Called {} successfully", url);
        Ok(value)
    }
}

#[async_trait]
impl ActionGateway for HttpActionGateway {
    #[instrument(skip(self, request), fields(connection = %request.connection, action = %request.action))]
    async fn execute(&self, request: &ActionRequest) -> Result<ActionResponse, GatewayError> {
        let url = self.endpoint("agent/action");
        debug!("Executing action with {} parameters", request.params.len());

        let response: ActionResponse = self.send(&url, self.client.post(&url).json(request)).await?;
        info!(status = %response.status, "Called {} successfully", url);
        Ok(response)
    }
}

#[async_trait]
impl AgentControl for HttpActionGateway {
    async fn load_agent(&self, name: &str) -> Result<serde_json::Value, GatewayError> {
        self.post_empty(&format!("agents/{name}/load")).await
    }

    async fn connection_status(&self, connection: &str) -> Result<serde_json::Value, GatewayError> {
        let url = self.endpoint(&format!("connections/{connection}/status"));
        let value = self.send(&url, self.client.get(&url)).await?;
        info!("Called {} successfully", url);
        Ok(value)
    }

    async fn start_agent(&self) -> Result<serde_json::Value, GatewayError> {
        self.post_empty("agent/start").await
    }

    async fn stop_agent(&self) -> Result<serde_json::Value, GatewayError> {
        self.post_empty("agent/stop").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let gateway =
            HttpActionGateway::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            gateway.endpoint("agent/action"),
            "http://localhost:8000/agent/action"
        );

        let gateway =
            HttpActionGateway::new("http://localhost:8000", Duration::from_secs(5)).unwrap();
        assert_eq!(
            gateway.endpoint("connections/telegram/status"),
            "http://localhost:8000/connections/telegram/status"
        );
    }
}
