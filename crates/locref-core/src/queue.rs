// crates/locref-core/src/queue.rs
//! # Background Jobs and Notifications
//!
//! The import pipeline itself is synchronous; scheduling it and telling
//! users about the outcome happen behind the two seams here. [`JobQueue`]
//! accepts [`ImportJob`]s for later execution, [`Notifier`] publishes
//! fire-and-forget events. Both ship with log-backed defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::QueueError;

/// Queue name import jobs are placed on.
pub const QUEUE_LONG: &str = "long";
/// Stable job name, also used for deduplication by queue backends.
pub const IMPORT_JOB_NAME: &str = "location_data_import";
/// Wall-clock budget for one full import run.
pub const IMPORT_JOB_TIMEOUT: Duration = Duration::from_secs(3600);

/// Recipient of import outcome events.
pub const ADMIN_USER: &str = "Administrator";
pub const EVENT_IMPORT_COMPLETED: &str = "location_import_completed";
pub const EVENT_IMPORT_FAILED: &str = "location_import_failed";

/// A queued request to run the import pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportJob {
    pub force_update: bool,
    /// City batch size for the run.
    pub chunk_size: usize,
    pub queue: String,
    pub timeout: Duration,
    pub job_name: String,
}

impl ImportJob {
    /// Standard shape of an import job: long queue, one hour budget.
    pub fn chunked(force_update: bool, chunk_size: usize) -> Self {
        ImportJob {
            force_update,
            chunk_size,
            queue: QUEUE_LONG.to_string(),
            timeout: IMPORT_JOB_TIMEOUT,
            job_name: IMPORT_JOB_NAME.to_string(),
        }
    }

    /// First-run preset: overwrite everything, small batches.
    pub fn install_default() -> Self {
        Self::chunked(true, 25)
    }

    /// Recurring refresh preset: skip what exists, medium batches.
    pub fn scheduled_default() -> Self {
        Self::chunked(false, 50)
    }
}

/// Hands jobs to whatever runs them later.
pub trait JobQueue {
    fn enqueue(&self, job: ImportJob) -> Result<(), QueueError>;
}

/// Fire-and-forget outcome events for interested users.
///
/// Publishing must never fail the import; implementations swallow their
/// own errors.
pub trait Notifier {
    fn publish(&self, event: &str, message: &str, user: &str);
}

/// Notifier that writes events to the log. The default where no realtime
/// channel is wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn publish(&self, event: &str, message: &str, user: &str) {
        info!(event, user, "{message}");
    }
}

/// Enqueues a chunked refresh on the long queue.
pub fn queue_location_refresh(
    queue: &dyn JobQueue,
    force_update: bool,
    chunk_size: usize,
) -> Result<(), QueueError> {
    info!(force_update, chunk_size, "queuing location data import");
    queue.enqueue(ImportJob::chunked(force_update, chunk_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn presets_differ_only_in_force_and_chunk() {
        let install = ImportJob::install_default();
        let scheduled = ImportJob::scheduled_default();

        assert!(install.force_update);
        assert_eq!(install.chunk_size, 25);
        assert!(!scheduled.force_update);
        assert_eq!(scheduled.chunk_size, 50);

        for job in [&install, &scheduled] {
            assert_eq!(job.queue, QUEUE_LONG);
            assert_eq!(job.job_name, IMPORT_JOB_NAME);
            assert_eq!(job.timeout, IMPORT_JOB_TIMEOUT);
        }
    }

    #[test]
    fn queue_location_refresh_enqueues_one_chunked_job() {
        struct Recorder(RefCell<Vec<ImportJob>>);
        impl JobQueue for Recorder {
            fn enqueue(&self, job: ImportJob) -> Result<(), QueueError> {
                self.0.borrow_mut().push(job);
                Ok(())
            }
        }

        let recorder = Recorder(RefCell::new(Vec::new()));
        queue_location_refresh(&recorder, false, 50).unwrap();

        let jobs = recorder.0.borrow();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0], ImportJob::chunked(false, 50));
    }
}
