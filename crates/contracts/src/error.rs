//! Layered error definitions
//!
//! Categorized by stage: config / input / staging / transfer

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum HarnessError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// Destination scheme matches no known transfer backend
    #[error("unrecognized destination URL: {url}")]
    UnrecognizedDestination { url: String },

    // ===== Input Errors =====
    /// No source image matched the sensor under the lookup root
    #[error("no source image for sensor '{sensor}' under {root}")]
    InputNotFound { sensor: String, root: PathBuf },

    // ===== Staging Errors =====
    /// Copy or compression failure while staging an exposure
    #[error("staging error for '{path}': {message}")]
    Staging { path: PathBuf, message: String },

    // ===== Transfer Errors =====
    /// Non-success response or transport failure in a backend
    #[error("transfer error on backend '{backend}': {message}")]
    Transfer { backend: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create unrecognized destination error
    pub fn unrecognized_destination(url: impl Into<String>) -> Self {
        Self::UnrecognizedDestination { url: url.into() }
    }

    /// Create input lookup error
    pub fn input_not_found(sensor: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self::InputNotFound {
            sensor: sensor.into(),
            root: root.into(),
        }
    }

    /// Create staging error
    pub fn staging(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Staging {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create transfer error
    pub fn transfer(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transfer {
            backend: backend.into(),
            message: message.into(),
        }
    }
}
