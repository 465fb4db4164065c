//! SensorWorker - one sensor's exposure loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use tracing::{error, info, instrument};

use contracts::{Exposure, ExposureNamer, HarnessError, RunConfig, SensorName, Uploader};
use observability::{
    record_exposure_failed, record_exposure_late, record_exposure_started,
    record_staging_duration, record_transfer_duration, record_worker_finished,
};
use scheduler::ExposureScheduler;

use crate::stats::{WorkerOutcome, WorkerStats};

/// One sensor's wait/stage/transfer loop
///
/// Owns its scheduler, scratch root, and transfer session; shares nothing
/// with sibling workers. Exposures are processed strictly in index order,
/// one at a time.
pub struct SensorWorker<U> {
    sensor: SensorName,
    config: Arc<RunConfig>,
    scheduler: ExposureScheduler,
    uploader: U,
    scratch_root: PathBuf,
    namer: ExposureNamer,
    source: Option<PathBuf>,
    stats: WorkerStats,
}

impl<U: Uploader> SensorWorker<U> {
    pub fn new(
        sensor: SensorName,
        config: Arc<RunConfig>,
        scheduler: ExposureScheduler,
        uploader: U,
        scratch_root: PathBuf,
    ) -> Self {
        let namer = ExposureNamer::new(Local::now().date_naive(), &config.camera, sensor.clone());
        Self {
            sensor,
            config,
            scheduler,
            uploader,
            scratch_root,
            namer,
            source: None,
            stats: WorkerStats::default(),
        }
    }

    /// Run the exposure loop to completion or first failure.
    ///
    /// A staging or transfer error aborts this worker's remaining exposures;
    /// siblings are unaffected.
    #[instrument(name = "sensor_worker", skip(self), fields(sensor = %self.sensor))]
    pub async fn run(mut self) -> WorkerOutcome {
        info!(
            exposures = self.config.numexp,
            interval = self.config.interval,
            "Worker starting"
        );

        let result = self.run_loop().await;
        record_worker_finished(&self.sensor, result.is_ok());

        match &result {
            Ok(()) => info!(
                completed = self.stats.exposures_completed,
                late = self.stats.late_exposures,
                "Worker finished"
            ),
            Err(e) => error!(
                completed = self.stats.exposures_completed,
                error = %e,
                "Worker aborted"
            ),
        }

        WorkerOutcome {
            sensor: self.sensor.clone(),
            stats: self.stats.clone(),
            error: result.err().map(|e| e.to_string()),
        }
    }

    async fn run_loop(&mut self) -> Result<(), HarnessError> {
        for index in 0..self.config.numexp {
            self.handle_exposure(index).await?;
        }
        Ok(())
    }

    async fn handle_exposure(&mut self, index: u32) -> Result<(), HarnessError> {
        // Single lateness decision: stats come from the same delay the
        // scheduler observed and logged
        let delay = self.scheduler.wait_for(index).await;
        if delay < chrono::Duration::zero() {
            self.stats.late_exposures += 1;
            record_exposure_late(
                &self.sensor,
                delay.num_milliseconds().unsigned_abs() as f64 / 1000.0,
            );
        }
        record_exposure_started(&self.sensor);

        let exposure = Exposure::new(self.config.starttime, index);
        let relative = self.namer.relative_path(exposure);
        let source = self.source()?;

        let staging_started = Instant::now();
        let staged = match staging::stage(
            &source,
            &self.scratch_root,
            &relative,
            self.config.compress,
        )
        .await
        {
            Ok(staged) => staged,
            Err(e) => {
                record_exposure_failed(&self.sensor, "staging");
                return Err(e);
            }
        };
        let staging_elapsed = staging_started.elapsed();

        let bytes = tokio::fs::metadata(self.scratch_root.join(&staged))
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        self.stats.bytes_staged += bytes;
        self.stats.staging_secs.push(staging_elapsed.as_secs_f64());
        record_staging_duration(&self.sensor, staging_elapsed.as_secs_f64(), bytes);
        info!(
            sequence = exposure.sequence,
            staged = %staged.display(),
            bytes,
            elapsed_ms = staging_elapsed.as_millis() as u64,
            "Staged exposure"
        );

        let transfer_started = Instant::now();
        if let Err(e) = self.uploader.transfer(&self.scratch_root, &staged).await {
            record_exposure_failed(&self.sensor, "transfer");
            return Err(e);
        }
        let transfer_elapsed = transfer_started.elapsed();

        self.stats
            .transfer_secs
            .push(transfer_elapsed.as_secs_f64());
        record_transfer_duration(self.uploader.name(), transfer_elapsed.as_secs_f64());
        info!(
            sequence = exposure.sequence,
            backend = self.uploader.name(),
            elapsed_ms = transfer_elapsed.as_millis() as u64,
            "Transferred exposure"
        );

        self.stats.exposures_completed += 1;
        Ok(())
    }

    /// Source image for this sensor, resolved lazily at the first staging.
    fn source(&mut self) -> Result<PathBuf, HarnessError> {
        if let Some(path) = &self.source {
            return Ok(path.clone());
        }
        let path = staging::resolve_source(
            self.config.inputfile.as_deref(),
            &self.config.inputdir,
            &self.sensor,
        )?;
        info!(source = %path.display(), "Resolved source image");
        self.source = Some(path.clone());
        Ok(path)
    }
}
