//! # Relay Commands
//!
//! Inbound command handling for the reading relay.
//!
//! This crate turns platform updates into [`CommandRequest`]s, gates them
//! with a [`CooldownStore`], and drives the reading notification sequence
//! through an action gateway with the [`CommandRelay`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cooldown;
pub mod error;
pub mod messages;
pub mod relay;
pub mod request;
pub mod sled_store;
pub mod update;

pub use cooldown::*;
pub use error::*;
pub use relay::*;
pub use request::*;
pub use sled_store::*;
pub use update::*;
