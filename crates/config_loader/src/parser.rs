//! Configuration parsing module
//!
//! Supports TOML (primary) and JSON formats.

use contracts::{HarnessError, RunConfig};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format (preferred)
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Infer format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML configuration
pub fn parse_toml(content: &str) -> Result<RunConfig, HarnessError> {
    toml::from_str(content).map_err(|e| HarnessError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON configuration
pub fn parse_json(content: &str) -> Result<RunConfig, HarnessError> {
    serde_json::from_str(content).map_err(|e| HarnessError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse configuration by format
pub fn parse(content: &str, format: ConfigFormat) -> Result<RunConfig, HarnessError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}
