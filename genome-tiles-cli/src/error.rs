//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::process;

use genome_tiles::config::ConfigFileError;
use genome_tiles::{FetchError, ViewportError};
use thiserror::Error;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug, Error)]
pub enum CliError {
    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Configuration file could not be read or written
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigFileError),

    /// Viewport arguments rejected
    #[error("Invalid viewport: {0}")]
    Viewport(#[from] ViewportError),

    /// Tile or feature file could not be loaded
    #[error("Failed to load tile: {0}")]
    Fetch(#[from] FetchError),

    /// Failed to read an input file
    #[error("Failed to read file '{path}': {error}")]
    FileRead {
        path: String,
        #[source]
        error: std::io::Error,
    },

    /// Nesting warnings found in strict mode
    #[error("{0} nesting warning(s) found")]
    NestingWarnings(usize),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Fetch(FetchError::Http { status: 404, .. }) => {
                eprintln!();
                eprintln!("The tile file does not exist. Check that:");
                eprintln!("  1. --base-url points at a .vgenes-dir directory");
                eprintln!("  2. --start is a multiple of --span");
                eprintln!("  3. --macro is set for macro-level spans");
            }
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Run 'genome-tiles config path' to locate the configuration file.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = CliError::from(FetchError::Http {
            status: 404,
            status_text: "Not Found".into(),
        });
        assert_eq!(
            err.to_string(),
            "Failed to load tile: HTTP request error: Not Found (404)"
        );

        let err = CliError::from(ViewportError::InvalidWidth(0.0));
        assert_eq!(err.to_string(), "Invalid viewport: Invalid pixel width: 0");

        assert_eq!(
            CliError::NestingWarnings(3).to_string(),
            "3 nesting warning(s) found"
        );
    }
}
