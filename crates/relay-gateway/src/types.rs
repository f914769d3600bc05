//! Wire types of the action gateway.

use crate::error::ResultError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Sends a text message: `[target, text]`.
pub const SEND_MESSAGE: &str = "send-message";
/// Sends an image with a caption: `[target, caption, image]`.
pub const SEND_MESSAGE_WITH_IMAGE: &str = "send-message-with-image";
/// Performs a reading; takes no parameters.
pub const PERFORM_READING: &str = "perform-reading";
/// Registers the platform webhook: `[url, secret, allowed_updates...]`.
pub const SET_WEBHOOK: &str = "set-webhook";
/// Removes the platform webhook.
pub const DELETE_WEBHOOK: &str = "delete-webhook";

/// Status value of a successful action.
pub const STATUS_SUCCESS: &str = "success";

/// A named action to execute on a named connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Connection that owns the action (e.g. "telegram").
    pub connection: String,
    /// Action name.
    pub action: String,
    /// Positional parameters.
    pub params: Vec<String>,
}

impl ActionRequest {
    /// Creates a request.
    pub fn new(
        connection: impl Into<String>,
        action: impl Into<String>,
        params: Vec<String>,
    ) -> Self {
        Self {
            connection: connection.into(),
            action: action.into(),
            params,
        }
    }

    /// `send-message(target, text)`
    pub fn send_message(
        connection: impl Into<String>,
        target: impl Display,
        text: impl Into<String>,
    ) -> Self {
        Self::new(connection, SEND_MESSAGE, vec![target.to_string(), text.into()])
    }

    /// `send-message-with-image(target, caption, image)`
    pub fn send_message_with_image(
        connection: impl Into<String>,
        target: impl Display,
        caption: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self::new(
            connection,
            SEND_MESSAGE_WITH_IMAGE,
            vec![target.to_string(), caption.into(), image.into()],
        )
    }

    /// `perform-reading()`
    pub fn perform_reading(connection: impl Into<String>) -> Self {
        Self::new(connection, PERFORM_READING, Vec::new())
    }

    /// `set-webhook(url, secret, allowed_updates...)`
    pub fn set_webhook(
        connection: impl Into<String>,
        url: impl Into<String>,
        secret: impl Into<String>,
        allowed_updates: &[String],
    ) -> Self {
        let mut params = vec![url.into(), secret.into()];
        params.extend(allowed_updates.iter().cloned());
        Self::new(connection, SET_WEBHOOK, params)
    }

    /// `delete-webhook()`
    pub fn delete_webhook(connection: impl Into<String>) -> Self {
        Self::new(connection, DELETE_WEBHOOK, Vec::new())
    }
}

/// Response of an action call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionResponse {
    /// "success" or anything else.
    #[serde(default)]
    pub status: String,
    /// Action-specific payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

impl ActionResponse {
    /// A successful response with a payload.
    pub fn success(result: Option<serde_json::Value>) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            result,
        }
    }

    /// Whether the gateway reported success.
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// Decodes the payload of a `perform-reading` response.
    pub fn reading(&self) -> Result<ReadingResult, ResultError> {
        let result = self.result.clone().ok_or(ResultError::Missing)?;
        Ok(serde_json::from_value(result)?)
    }
}

/// Payload of a completed reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingResult {
    /// Image to attach to the result.
    pub image_url: String,
    /// Full reading text sent to the requester.
    pub reading_long: String,
    /// Short form, used for posts elsewhere.
    #[serde(default)]
    pub reading_short: String,
    /// Prompt used to generate the image. Logged only.
    #[serde(default)]
    pub prompt: String,
}
