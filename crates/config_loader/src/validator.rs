//! Configuration validation module
//!
//! Rules:
//! - destination is non-empty
//! - numexp >= 1
//! - sensor selection names at least one sensor
//! - sensor names are non-empty and unique
//! - camera tag is non-empty

use std::collections::HashSet;

use contracts::{HarnessError, RunConfig, SensorSelection};

/// Validate a RunConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &RunConfig) -> Result<(), HarnessError> {
    validate_destination(config)?;
    validate_exposures(config)?;
    validate_sensors(config)?;
    validate_camera(config)?;
    Ok(())
}

fn validate_destination(config: &RunConfig) -> Result<(), HarnessError> {
    if config.destination.trim().is_empty() {
        return Err(HarnessError::config_validation(
            "destination",
            "destination URL cannot be empty",
        ));
    }
    Ok(())
}

fn validate_exposures(config: &RunConfig) -> Result<(), HarnessError> {
    if config.numexp == 0 {
        return Err(HarnessError::config_validation(
            "numexp",
            "numexp must be >= 1",
        ));
    }
    Ok(())
}

/// Validate sensor selection: at least one sensor, unique non-empty names
fn validate_sensors(config: &RunConfig) -> Result<(), HarnessError> {
    if config.sensors.is_empty() {
        return Err(HarnessError::config_validation(
            "sensors",
            "at least one sensor is required",
        ));
    }

    if let SensorSelection::Names(names) = &config.sensors {
        let mut seen = HashSet::new();
        for name in names {
            if name.is_empty() {
                return Err(HarnessError::config_validation(
                    "sensors",
                    "sensor name cannot be empty",
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(HarnessError::config_validation(
                    format!("sensors[{name}]"),
                    "duplicate sensor name",
                ));
            }
        }
    }
    Ok(())
}

fn validate_camera(config: &RunConfig) -> Result<(), HarnessError> {
    if config.camera.is_empty() {
        return Err(HarnessError::config_validation(
            "camera",
            "camera tag cannot be empty",
        ));
    }
    Ok(())
}
