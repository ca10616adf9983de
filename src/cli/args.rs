//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Pagemirror - mirror published pages behind local paths.
#[derive(Debug, Parser)]
#[command(name = "pagemirror")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the state file (overrides ~/.pagemirror/state.json)
    #[arg(long, global = true, env = "PAGEMIRROR_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// Platform API origin (staging/testing)
    #[arg(long, global = true, env = "PAGEMIRROR_API_BASE", hide = true)]
    pub api_base: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage the platform API token
    Token(TokenArgs),

    /// Manage routing rules
    Rules(RulesArgs),

    /// Manage the content cache
    Cache(CacheArgs),

    /// Show the aggregated site data as JSON
    Site,

    /// Route a local path and print the mirrored content
    Route(RouteArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `token` command.
#[derive(Debug, clap::Args)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenSubcommand,
}

/// Token subcommands.
#[derive(Debug, Subcommand)]
pub enum TokenSubcommand {
    /// Save a site token (must be a v2 token)
    Set {
        /// The token value
        token: String,
    },
    /// Probe which API generation a token authenticates against
    Check {
        /// The token value
        token: String,
    },
    /// Remove the saved token
    Remove {
        /// Also delete all routing rules
        #[arg(long)]
        drop_data: bool,
    },
    /// Show whether a token is saved and its resolved version
    Status,
}

/// Arguments for the `rules` command.
#[derive(Debug, clap::Args)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub command: RulesSubcommand,
}

/// Which rule bucket a rules subcommand operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum KindArg {
    Static,
    Dynamic,
}

/// Rules subcommands.
#[derive(Debug, Subcommand)]
pub enum RulesSubcommand {
    /// List rules
    List {
        /// Rule bucket
        #[arg(long, value_enum, default_value = "static")]
        kind: KindArg,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace a rule bucket from a JSON file of [local, remote] pairs
    Save {
        /// Rule bucket
        #[arg(long, value_enum, default_value = "static")]
        kind: KindArg,
        /// Path to the JSON rules file ("-" for stdin)
        file: PathBuf,
    },
    /// Append one rule and save the bucket
    Add {
        /// Rule bucket
        #[arg(long, value_enum, default_value = "static")]
        kind: KindArg,
        /// Local path (e.g. /about or /blog/*)
        local: String,
        /// Remote target path (e.g. /about)
        remote: String,
    },
    /// Remove the rule at an index and save the bucket
    Remove {
        /// Rule bucket
        #[arg(long, value_enum, default_value = "static")]
        kind: KindArg,
        /// Zero-based index into the listed rules
        index: usize,
    },
}

/// Arguments for the `cache` command.
#[derive(Debug, clap::Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheSubcommand,
}

/// Cache subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheSubcommand {
    /// Drop every cached page and the site snapshot
    Invalidate,
    /// Eagerly fetch every static rule target
    Preload,
    /// Show or change the cache TTL in seconds (0 = never expire)
    Duration {
        /// New TTL; omit to print the current value
        seconds: Option<u64>,
    },
}

/// Arguments for the `route` command.
#[derive(Debug, clap::Args)]
pub struct RouteArgs {
    /// The local request path (e.g. /about)
    pub path: String,
}

/// Arguments for the `completions` command.
#[derive(Debug, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
