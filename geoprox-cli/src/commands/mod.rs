//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (path, show, init)
//! - [`distance`] - Distance and bearing between two points
//! - [`search`] - Proximity search over a record snapshot

pub mod config;
pub mod distance;
pub mod search;
