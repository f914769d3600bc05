//! # Relay Config
//!
//! Type-safe configuration management for the reading relay.
//!
//! This crate provides the configuration schema with defaults, file loading
//! (TOML, YAML or JSON) with environment overrides, atomic persistence and
//! validation.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod defaults;
pub mod loader;
pub mod schema;
pub mod validator;

pub use defaults::*;
pub use loader::*;
pub use schema::*;
pub use validator::*;
