//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::RunConfig;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    destination: String,
    backend: String,
    starttime: String,
    exposures: u32,
    sensor_count: usize,
    interval_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    compression: Option<String>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Load, validate, and resolve the destination scheme
    let config = match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => config,
        Err(e) => {
            return ValidationResult {
                valid: false,
                config_path,
                error: Some(e.to_string()),
                warnings: None,
                summary: None,
            }
        }
    };

    match transfer::Destination::parse(&config.destination) {
        Ok(destination) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    destination: config.destination.clone(),
                    backend: destination.backend_name().to_string(),
                    starttime: config.starttime.to_string(),
                    exposures: config.numexp,
                    sensor_count: config.sensors.len(),
                    interval_secs: config.interval,
                    compression: config.compress.map(|c| c.to_string()),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &RunConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.interval == 0 {
        warnings.push("interval is 0 - every exposure is due immediately".to_string());
    }

    if config.compress == Some(contracts::Compression::Fpack) {
        warnings.push("fpack compression shells out to the external 'fpack' binary".to_string());
    }

    if config.inputfile.is_none() && !config.inputdir.is_dir() {
        warnings.push(format!(
            "input directory {} does not exist yet - workers will fail at first staging",
            config.inputdir.display()
        ));
    }

    if config.private {
        warnings.push("private routing appends to the hosts file and needs write access".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Destination: {} ({})", summary.destination, summary.backend);
            println!("  Start time: {}", summary.starttime);
            println!("  Exposures per sensor: {}", summary.exposures);
            println!("  Sensors: {}", summary.sensor_count);
            println!("  Interval: {}s", summary.interval_secs);
            if let Some(ref compression) = summary.compression {
                println!("  Compression: {}", compression);
            }
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
