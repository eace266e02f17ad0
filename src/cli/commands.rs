//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::planner::DEFAULT_PLAN_FILE;

/// azsubsyn - Sync resource provider and preview feature registrations
/// between Azure subscriptions.
#[derive(Parser, Debug)]
#[command(name = "azsubsyn")]
#[command(author, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Load environment variables from this dotenv file (default: ./.env if present).
    #[arg(long, global = true, env = "AZSUBSYN_ENV_FILE")]
    pub env_file: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate environment variables and test connectivity to both subscriptions.
    Credcheck,

    /// Compare the subscriptions and write a plan file.
    Plan {
        /// Where to write the plan.
        #[arg(long, default_value = DEFAULT_PLAN_FILE)]
        out: PathBuf,
    },

    /// Read a plan file and perform the registrations on the target.
    Apply {
        /// Plan file to apply.
        #[arg(long, default_value = DEFAULT_PLAN_FILE)]
        plan: PathBuf,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,

        /// Exit with an error if any entry fails to register.
        #[arg(long)]
        strict: bool,
    },

    /// Print the version.
    Version,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
