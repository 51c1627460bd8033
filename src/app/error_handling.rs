//! Error handling utilities
//!
//! This module provides centralized error handling for the application.

use tracing::error;

use crate::error::Error;

const GENERAL_ERROR: i32 = 1;
const ARGUMENT_ERROR: i32 = 2;

/// Exit code for an error surfaced at the binary boundary
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<Error>() {
        Some(Error::Validation(_)) | Some(Error::Config(_)) | Some(Error::Toml(_)) => {
            ARGUMENT_ERROR
        }
        _ => GENERAL_ERROR,
    }
}

/// Handle fatal errors and exit with appropriate status code
///
/// Invalid input and configuration exit with 2, everything else with 1.
/// With `verbose >= 1` the full error chain is printed.
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    error!("Fatal error: {}", error);
    eprintln!("Error: {error}");

    if verbose >= 1 {
        eprintln!("\nError chain:");
        for (i, cause) in error.chain().enumerate() {
            eprintln!("  {}: {}", i, cause);
        }
    }

    std::process::exit(exit_code_for(&error))
}
