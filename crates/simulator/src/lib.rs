//! # Simulator
//!
//! Per-sensor orchestration and process fan-out.
//!
//! [`run`] derives the run's shared parameters (node identity, resolved
//! destination, optional private-network routing), spawns one independent
//! worker task per simulated sensor, and joins them all at shutdown. Workers
//! share no mutable state; each owns its own scheduler, scratch directory,
//! and transfer session, and each independently computes the same baseline
//! from the configured start time.

mod node;
mod stats;
mod worker;

pub use node::{append_hosts_override, node_number, node_number_from, private_ip};
pub use stats::{RunSummary, WorkerOutcome, WorkerStats};
pub use worker::SensorWorker;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use contracts::{HarnessError, RunConfig, SensorName};
use scheduler::ExposureScheduler;
use transfer::{Destination, SessionConfig, TransferSession};

/// Fan-out options not carried by the run configuration
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Hosts file receiving the private-network override
    pub hosts_file: PathBuf,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            hosts_file: PathBuf::from("/etc/hosts"),
        }
    }
}

/// Run a whole simulation: fan out one worker per sensor, join them all.
///
/// Worker failures are collected into the summary, not propagated; a sibling
/// failure never interrupts the other workers. The returned future completes
/// when the last worker has joined.
///
/// # Errors
/// Fatal before spawn: an unrecognized destination, an unwritable hosts
/// file when private routing is requested, or an uncreatable scratch root.
pub async fn run(
    config: RunConfig,
    session_config: SessionConfig,
    options: RunOptions,
) -> Result<RunSummary, HarnessError> {
    let started = Instant::now();

    let destination = Destination::parse(&config.destination)?;
    let node = node::node_number();
    let sensors = config.sensors.resolve(node);
    info!(
        node,
        workers = sensors.len(),
        backend = destination.backend_name(),
        exposures = config.numexp,
        "Fanning out workers"
    );

    if config.private {
        node::append_hosts_override(&options.hosts_file, session_config.endpoint_host(), node)?;
    }

    std::fs::create_dir_all(&config.tempdir)?;

    let config = Arc::new(config);
    let mut handles = Vec::with_capacity(sensors.len());
    for sensor in sensors {
        let config = Arc::clone(&config);
        let destination = destination.clone();
        let session_config = session_config.clone();
        let task_sensor = sensor.clone();
        let handle = tokio::spawn(async move {
            spawn_worker(task_sensor, config, destination, session_config).await
        });
        handles.push((sensor, handle));
    }

    // Wait-for-all barrier; the process exits cleanly after the last join
    let mut workers = Vec::with_capacity(handles.len());
    for (sensor, handle) in handles {
        match handle.await {
            Ok(outcome) => workers.push(outcome),
            Err(e) => {
                error!(sensor = %sensor, error = %e, "Worker task panicked");
                workers.push(WorkerOutcome {
                    sensor,
                    stats: WorkerStats::default(),
                    error: Some(format!("worker task panicked: {e}")),
                });
            }
        }
    }

    let summary = RunSummary {
        workers,
        duration: started.elapsed(),
    };
    info!(
        workers = summary.workers.len(),
        failed = summary.failed_workers(),
        exposures = summary.total_exposures(),
        duration_secs = summary.duration.as_secs_f64(),
        "All workers joined"
    );
    Ok(summary)
}

/// Build and run one sensor's worker.
///
/// Setup failures (scratch dir, scheduler, session connect) become that
/// worker's outcome rather than crashing the run.
async fn spawn_worker(
    sensor: SensorName,
    config: Arc<RunConfig>,
    destination: Destination,
    session_config: SessionConfig,
) -> WorkerOutcome {
    let scratch = match tempfile::Builder::new()
        .prefix(&format!("ccd-{sensor}-"))
        .tempdir_in(&config.tempdir)
    {
        Ok(scratch) => scratch,
        Err(e) => return setup_failure(sensor, format!("cannot create scratch directory: {e}")),
    };

    let scheduler = match ExposureScheduler::for_today(config.starttime, config.interval) {
        Ok(scheduler) => scheduler,
        Err(e) => return setup_failure(sensor, e.to_string()),
    };

    let session = match TransferSession::connect(&destination, &session_config).await {
        Ok(session) => session,
        Err(e) => return setup_failure(sensor, e.to_string()),
    };

    let worker = SensorWorker::new(
        sensor,
        config,
        scheduler,
        session,
        scratch.path().to_path_buf(),
    );
    let outcome = worker.run().await;

    // Scratch directory and its staged files are torn down here
    drop(scratch);
    outcome
}

fn setup_failure(sensor: SensorName, message: String) -> WorkerOutcome {
    error!(sensor = %sensor, error = %message, "Worker failed before its exposure loop");
    WorkerOutcome {
        sensor,
        stats: WorkerStats::default(),
        error: Some(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unrecognized_destination_is_fatal_before_spawn() {
        let starttime = "00:00".parse().unwrap();
        let config = RunConfig::new("ftp://host/path", starttime, 1);

        let err = run(config, SessionConfig::default(), RunOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, HarnessError::UnrecognizedDestination { .. }));
    }
}
