//! CLI module for azsubsyn.
//!
//! This module provides the command-line interface for checking
//! credentials, planning, and applying subscription syncs.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;
