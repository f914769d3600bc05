//! In-process gateway double that records calls and answers from a script.

use crate::error::GatewayError;
use crate::traits::{ActionGateway, AgentControl};
use crate::types::{ActionRequest, ActionResponse, ReadingResult, PERFORM_READING};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Notify;

/// How the double answers `perform-reading`.
#[derive(Debug, Clone)]
pub enum ReadingScript {
    /// Success with the given payload.
    Success(ReadingResult),
    /// A response whose status is not "success".
    Rejected(String),
    /// "success" without a usable result.
    Malformed,
    /// A non-2xx HTTP answer with the given status code.
    HttpStatus(u16),
    /// A transport failure.
    Unreachable,
}

/// Recording [`ActionGateway`] and [`AgentControl`] double.
#[derive(Debug)]
pub struct RecordingGateway {
    requests: Mutex<Vec<ActionRequest>>,
    lifecycle: Mutex<Vec<String>>,
    reading: Mutex<ReadingScript>,
    failing_actions: Mutex<HashSet<String>>,
    reading_gate: Mutex<Option<Arc<Notify>>>,
}

impl RecordingGateway {
    /// A gateway whose readings succeed with [`sample_reading`].
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            lifecycle: Mutex::new(Vec::new()),
            reading: Mutex::new(ReadingScript::Success(sample_reading())),
            failing_actions: Mutex::new(HashSet::new()),
            reading_gate: Mutex::new(None),
        }
    }

    /// Sets how `perform-reading` is answered.
    pub fn with_reading(self, script: ReadingScript) -> Self {
        *self.reading.lock() = script;
        self
    }

    /// Makes every call of `action` fail with a transport error.
    pub fn fail_action(self, action: &str) -> Self {
        self.failing_actions.lock().insert(action.to_string());
        self
    }

    /// Holds `perform-reading` open until the returned notifier fires.
    pub fn hold_readings(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.reading_gate.lock() = Some(gate.clone());
        gate
    }

    /// Every action request received, in order.
    pub fn requests(&self) -> Vec<ActionRequest> {
        self.requests.lock().clone()
    }

    /// Action names received, in order.
    pub fn actions(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|request| request.action.clone())
            .collect()
    }

    /// Lifecycle calls received, in order (e.g. `load:tarot-reader`, `start`).
    pub fn lifecycle_calls(&self) -> Vec<String> {
        self.lifecycle.lock().clone()
    }

    fn record_lifecycle(&self, call: String) -> Result<serde_json::Value, GatewayError> {
        let failing = self.failing_actions.lock().contains(&call);
        self.lifecycle.lock().push(call.clone());
        if failing {
            return Err(unreachable_error(&call));
        }
        Ok(serde_json::json!({"status": "ok"}))
    }
}

impl Default for RecordingGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActionGateway for RecordingGateway {
    async fn execute(&self, request: &ActionRequest) -> Result<ActionResponse, GatewayError> {
        self.requests.lock().push(request.clone());

        if self.failing_actions.lock().contains(&request.action) {
            return Err(unreachable_error(&request.action));
        }
        if request.action != PERFORM_READING {
            return Ok(ActionResponse::success(None));
        }

        let gate = self.reading_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let script = self.reading.lock().clone();
        match script {
            ReadingScript::Success(reading) => Ok(ActionResponse::success(Some(
                serde_json::to_value(reading).map_err(|e| GatewayError::Decode {
                    url: "recording://agent/action".to_string(),
                    message: e.to_string(),
                })?,
            ))),
            ReadingScript::Rejected(status) => Ok(ActionResponse {
                status,
                result: None,
            }),
            ReadingScript::Malformed => Ok(ActionResponse::success(None)),
            ReadingScript::HttpStatus(status) => Err(GatewayError::Status {
                url: format!("recording://{PERFORM_READING}"),
                status,
            }),
            ReadingScript::Unreachable => Err(unreachable_error(PERFORM_READING)),
        }
    }
}

#[async_trait]
impl AgentControl for RecordingGateway {
    async fn load_agent(&self, name: &str) -> Result<serde_json::Value, GatewayError> {
        self.record_lifecycle(format!("load:{name}"))
    }

    async fn connection_status(&self, connection: &str) -> Result<serde_json::Value, GatewayError> {
        self.record_lifecycle(format!("status:{connection}"))
    }

    async fn start_agent(&self) -> Result<serde_json::Value, GatewayError> {
        self.record_lifecycle("start".to_string())
    }

    async fn stop_agent(&self) -> Result<serde_json::Value, GatewayError> {
        self.record_lifecycle("stop".to_string())
    }
}

/// A reading payload for tests.
pub fn sample_reading() -> ReadingResult {
    ReadingResult {
        image_url: "https://images.example/the-star.png".to_string(),
        reading_long: "The Star shines over the chain: calm waters ahead.".to_string(),
        reading_short: "The Star.".to_string(),
        prompt: "a luminous star above a quiet sea".to_string(),
    }
}

fn unreachable_error(call: &str) -> GatewayError {
    GatewayError::transport(
        format!("recording://{call}"),
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
    )
}
