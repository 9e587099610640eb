//! Tooling Layer
//!
//! Command-line access to a local tree store, acting as a chosen identity.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
