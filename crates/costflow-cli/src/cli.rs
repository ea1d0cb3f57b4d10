//! CLI argument definitions.

use clap::{Parser, Subcommand, ValueEnum};

use crate::commands::RunArgs;

/// Costflow - cost attribution engine command-line interface.
#[derive(Parser)]
#[command(name = "costflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format.
    #[arg(short, long, value_enum, default_value = "json", global = true)]
    pub format: OutputFormat,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run an allocation batch over a date window and commit its results.
    Run(RunArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// A single-line human summary.
    Minimal,
}
