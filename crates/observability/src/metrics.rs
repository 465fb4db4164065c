//! Exposure-loop metric recording
//!
//! Counters and histograms emitted by the sensor workers, plus the small
//! in-memory statistics used for the end-of-run summary.

use metrics::{counter, histogram};

/// Record the start of one exposure's stage/transfer cycle.
pub fn record_exposure_started(sensor: &str) {
    counter!(
        "ccd_streamer_exposures_started_total",
        "sensor" => sensor.to_string()
    )
    .increment(1);
}

/// Record a late exposure and how far behind schedule it ran.
pub fn record_exposure_late(sensor: &str, late_secs: f64) {
    counter!(
        "ccd_streamer_exposures_late_total",
        "sensor" => sensor.to_string()
    )
    .increment(1);
    histogram!("ccd_streamer_exposure_lateness_seconds").record(late_secs);
}

/// Record a completed staging step.
pub fn record_staging_duration(sensor: &str, secs: f64, bytes: u64) {
    histogram!(
        "ccd_streamer_staging_duration_seconds",
        "sensor" => sensor.to_string()
    )
    .record(secs);
    counter!("ccd_streamer_staged_bytes_total").increment(bytes);
}

/// Record a completed transfer.
pub fn record_transfer_duration(backend: &str, secs: f64) {
    counter!(
        "ccd_streamer_transfers_total",
        "backend" => backend.to_string()
    )
    .increment(1);
    histogram!(
        "ccd_streamer_transfer_duration_seconds",
        "backend" => backend.to_string()
    )
    .record(secs);
}

/// Record a failed exposure; `step` is `"staging"` or `"transfer"`.
pub fn record_exposure_failed(sensor: &str, step: &str) {
    counter!(
        "ccd_streamer_exposure_failures_total",
        "sensor" => sensor.to_string(),
        "step" => step.to_string()
    )
    .increment(1);
}

/// Record a worker leaving its exposure loop.
pub fn record_worker_finished(sensor: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "ccd_streamer_workers_finished_total",
        "sensor" => sensor.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Online statistics calculator (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a new value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum
    pub fn max(&self) -> f64 {
        self.max
    }
}

/// Snapshot of a [`RunningStats`] for display
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}
