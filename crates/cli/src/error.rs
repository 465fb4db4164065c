//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// A required run parameter is missing from both flags and config file
    #[error("Missing required option {option}; pass it as a flag or in --config")]
    MissingOption { option: String },

    /// One or more workers aborted before completing their exposures
    #[error("{failed} of {total} workers failed")]
    WorkersFailed { failed: usize, total: usize },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn missing_option(option: impl Into<String>) -> Self {
        Self::MissingOption {
            option: option.into(),
        }
    }

    pub fn workers_failed(failed: usize, total: usize) -> Self {
        Self::WorkersFailed { failed, total }
    }
}
