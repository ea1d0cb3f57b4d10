//! Output formatting utilities.

use serde::Serialize;

use crate::cli::OutputFormat;

/// Prints a single result in the requested format.
pub fn print_single<T: Serialize>(data: &T, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Minimal => println!("{}", serde_json::to_string(data)?),
    }
    Ok(())
}

/// Prints an error message to stderr.
pub fn print_error(message: &str) {
    eprintln!("error: {message}");
}

/// Prints a warning message to stderr.
pub fn print_warning(message: &str) {
    eprintln!("warning: {message}");
}
