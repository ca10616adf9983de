//! Command-line interface.
//!
//! The CLI is a host collaborator like any other: it builds an [`Engine`]
//! over a file-backed option store and the reqwest fetcher, then maps
//! subcommands onto the engine's operations.
//!
//! [`Engine`]: crate::engine::Engine

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};
pub use commands::dispatch;
