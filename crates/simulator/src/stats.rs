//! Run and worker statistics.

use std::time::Duration;

use contracts::SensorName;
use observability::RunningStats;

/// Counters accumulated by one worker over its exposure loop
#[derive(Debug, Clone, Default)]
pub struct WorkerStats {
    /// Exposures staged and transferred successfully
    pub exposures_completed: u32,

    /// Exposures whose due time had already passed when the wait began
    pub late_exposures: u32,

    /// Total size of staged artifacts
    pub bytes_staged: u64,

    /// Staging durations in seconds
    pub staging_secs: RunningStats,

    /// Transfer durations in seconds
    pub transfer_secs: RunningStats,
}

/// Final state of one sensor worker
#[derive(Debug, Clone)]
pub struct WorkerOutcome {
    pub sensor: SensorName,
    pub stats: WorkerStats,
    /// First error the worker hit, None when it ran to completion
    pub error: Option<String>,
}

impl WorkerOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregated result of a whole run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// One outcome per spawned worker, in spawn order
    pub workers: Vec<WorkerOutcome>,

    /// Wall time from fan-out to the last join
    pub duration: Duration,
}

impl RunSummary {
    /// Number of workers that aborted with an error.
    pub fn failed_workers(&self) -> usize {
        self.workers.iter().filter(|w| !w.succeeded()).count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed_workers() == 0
    }

    /// Exposures completed across all workers.
    pub fn total_exposures(&self) -> u64 {
        self.workers
            .iter()
            .map(|w| u64::from(w.stats.exposures_completed))
            .sum()
    }

    /// Total bytes staged across all workers.
    pub fn total_bytes_staged(&self) -> u64 {
        self.workers.iter().map(|w| w.stats.bytes_staged).sum()
    }

    /// Completed-exposure throughput over the run's wall time.
    pub fn exposures_per_second(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.total_exposures() as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(sensor: &str, completed: u32, error: Option<&str>) -> WorkerOutcome {
        WorkerOutcome {
            sensor: sensor.into(),
            stats: WorkerStats {
                exposures_completed: completed,
                ..Default::default()
            },
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_summary_counts() {
        let summary = RunSummary {
            workers: vec![
                outcome("SA", 3, None),
                outcome("SB", 1, Some("transfer error")),
            ],
            duration: Duration::from_secs(2),
        };

        assert_eq!(summary.failed_workers(), 1);
        assert!(!summary.all_succeeded());
        assert_eq!(summary.total_exposures(), 4);
        assert!((summary.exposures_per_second() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_summary() {
        let summary = RunSummary::default();
        assert!(summary.all_succeeded());
        assert_eq!(summary.total_exposures(), 0);
        assert_eq!(summary.exposures_per_second(), 0.0);
    }
}
