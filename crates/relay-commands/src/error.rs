//! Terminal failures of a single command.
//!
//! None of these reach the webhook transport: the update is acknowledged
//! before the relay runs, and failures are logged where the flow ends.

use crate::cooldown::StoreError;
use relay_gateway::{GatewayError, ResultError};
use thiserror::Error;

/// Reasons a command stops before its last notification.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Admission could not be decided. Never treated as allowed.
    #[error("cooldown store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// A gateway call produced no usable answer. Not retried.
    #[error("action gateway unreachable: {0}")]
    GatewayUnreachable(#[from] GatewayError),

    /// The gateway refused the reading, by action status or HTTP status.
    #[error("action gateway rejected '{action}' with status '{status}'")]
    GatewayRejected { action: String, status: String },

    /// A successful reading without a usable result.
    #[error("reading result is malformed: {0}")]
    MalformedReading(#[from] ResultError),
}
