//! # Scheduler
//!
//! Exposure cadence scheduling.
//!
//! Every worker owns one [`ExposureScheduler`] anchored at the shared
//! baseline (today's local date at the configured `HH:MM`). Exposure `i` is
//! due at `baseline + i * interval`; a worker sleeps until the due time, or
//! logs the lateness and proceeds immediately when the due time has already
//! passed. There is no catch-up and no frame dropping: a late exposure still
//! runs, it just runs late.

use chrono::{DateTime, Local, LocalResult, NaiveTime, TimeZone};
use std::time::Duration;
use tracing::info;

use contracts::{HarnessError, StartTime};

/// Blocking wait policy for one worker's exposure cadence
#[derive(Debug, Clone)]
pub struct ExposureScheduler {
    baseline: DateTime<Local>,
    interval_secs: u64,
}

impl ExposureScheduler {
    /// Scheduler anchored at today's local date at `start`, zero seconds.
    ///
    /// # Errors
    /// Fails when the configured wall-clock time does not exist on today's
    /// local calendar (daylight-saving gap).
    pub fn for_today(start: StartTime, interval_secs: u64) -> Result<Self, HarnessError> {
        let time = NaiveTime::from_hms_opt(u32::from(start.hour), u32::from(start.minute), 0)
            .ok_or_else(|| {
                HarnessError::config_validation("starttime", format!("invalid time {start}"))
            })?;
        let naive = Local::now().date_naive().and_time(time);
        let baseline = match Local.from_local_datetime(&naive) {
            LocalResult::Single(dt) => dt,
            LocalResult::Ambiguous(earliest, _) => earliest,
            LocalResult::None => {
                return Err(HarnessError::config_validation(
                    "starttime",
                    format!("{start} does not exist on today's local calendar"),
                ));
            }
        };
        Ok(Self::with_baseline(baseline, interval_secs))
    }

    /// Scheduler anchored at an explicit baseline instant.
    pub fn with_baseline(baseline: DateTime<Local>, interval_secs: u64) -> Self {
        Self {
            baseline,
            interval_secs,
        }
    }

    /// The instant exposure `index` is due.
    pub fn due_time(&self, index: u32) -> DateTime<Local> {
        self.baseline + chrono::Duration::seconds(self.interval_secs as i64 * i64::from(index))
    }

    /// Signed delay from `now` until exposure `index` is due.
    ///
    /// Negative when the due time has already passed.
    pub fn delay_from(&self, index: u32, now: DateTime<Local>) -> chrono::Duration {
        self.due_time(index).signed_duration_since(now)
    }

    /// Block until exposure `index` is due.
    ///
    /// When the due time has already passed, logs the lateness and returns
    /// immediately; the exposure still runs.
    ///
    /// Returns the signed delay measured at entry (negative when late), so
    /// callers account lateness from the same observation the log reports.
    pub async fn wait_for(&self, index: u32) -> chrono::Duration {
        let due = self.due_time(index);
        let delay = due.signed_duration_since(Local::now());
        let delay_secs = delay.num_milliseconds().abs() as f64 / 1000.0;

        if delay < chrono::Duration::zero() {
            info!(
                exposure = index,
                late_secs = delay_secs,
                due = %due,
                "Late for exposure, proceeding immediately"
            );
            return delay;
        }

        info!(
            exposure = index,
            sleep_secs = delay_secs,
            due = %due,
            "Sleeping until exposure due time"
        );
        tokio::time::sleep(delay.to_std().unwrap_or(Duration::ZERO)).await;
        delay
    }
}
