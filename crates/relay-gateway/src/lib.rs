//! # Relay Gateway
//!
//! Client side of the agent "action gateway": an HTTP service that executes
//! named actions on named connections (`{connection, action, params}`) and
//! answers with `{status, result}`.
//!
//! The relay talks to it through the [`ActionGateway`] and [`AgentControl`]
//! traits; [`HttpActionGateway`] is the reqwest implementation.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod error;
pub mod traits;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::*;
pub use error::*;
pub use traits::*;
pub use types::*;
