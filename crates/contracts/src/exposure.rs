//! Exposure identity and staged-file naming.

use chrono::NaiveDate;
use std::path::PathBuf;

use crate::{Compression, SensorName, StartTime};

/// Identity of one exposure within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exposure {
    /// Zero-based index within the run
    pub index: u32,
    /// Naming-only sequence number derived from the baseline
    pub sequence: u32,
}

impl Exposure {
    /// Derive the exposure identity for `index` under the run baseline.
    pub fn new(start: StartTime, index: u32) -> Self {
        Self {
            index,
            sequence: start.sequence_number(index),
        }
    }
}

/// Builds scratch-relative staged paths for one (observation day, sensor)
/// pair.
///
/// The observation day is captured once per worker at startup; a run crossing
/// midnight keeps naming its exposures under the day it started on.
#[derive(Debug, Clone)]
pub struct ExposureNamer {
    obs_day: String,
    obs_day_dashed: String,
    camera: String,
    sensor: SensorName,
}

impl ExposureNamer {
    pub fn new(day: NaiveDate, camera: impl Into<String>, sensor: SensorName) -> Self {
        Self {
            obs_day: day.format("%Y%m%d").to_string(),
            obs_day_dashed: day.format("%Y-%m-%d").to_string(),
            camera: camera.into(),
            sensor,
        }
    }

    /// Relative staged path for one exposure, without a compression rewrite.
    ///
    /// `2026-08-23/2026082314053/MC_O_20260823_14053_R22_S11.fits`
    pub fn relative_path(&self, exposure: Exposure) -> PathBuf {
        let mut path = PathBuf::from(&self.obs_day_dashed);
        path.push(format!("{}{:05}", self.obs_day, exposure.sequence));
        path.push(format!(
            "{}_O_{}_{:05}_{}.fits",
            self.camera, self.obs_day, exposure.sequence, self.sensor
        ));
        path
    }
}

/// Rewrite a staged path's extension for the chosen compressor.
///
/// `MC_O_..._S00.fits` becomes `MC_O_..._S00.fits.gz` or `.fits.fz`.
pub fn compressed_path(relative: &std::path::Path, compression: Compression) -> PathBuf {
    relative.with_extension(compression.extension())
}
