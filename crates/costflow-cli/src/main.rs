//! Costflow CLI - command-line interface for the cost attribution engine.
//!
//! # Usage
//!
//! ```bash
//! # Run the built-in demo scenario over a short window
//! costflow run --window-start 2024-01-01 --window-end 2024-01-03
//!
//! # Run a scenario loaded from disk
//! costflow run --window-start 2024-01-01 --window-end 2024-01-31 \
//!     --dimension instance_hours --scenario ./scenario.json
//! ```

use clap::Parser;

mod cli;
mod commands;
mod error;
mod output;

use cli::{Cli, Commands};
use output::print_error;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let format = cli.format;

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args, format).await,
    };

    if let Err(err) = result {
        print_error(&err.to_string());
        std::process::exit(1);
    }
}
