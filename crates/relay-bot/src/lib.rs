//! # Relay Bot
//!
//! Webhook front end of the reading relay.
//!
//! This is the main binary crate: it receives platform updates over HTTP,
//! hands reading commands to the [`relay_commands::CommandRelay`], and drives
//! the agent lifecycle on startup and shutdown.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod bot;
pub mod error;
pub mod lifecycle;
pub mod server;
pub mod shutdown;

pub use bot::*;
pub use error::*;
pub use lifecycle::*;
pub use server::*;
pub use shutdown::*;
