// # Import Monitor Handle
//
// Handle for registering jobs, delivering pipeline events, and
// subscribing to status notices. Provides the public API for
// interacting with the import monitor.

use crate::import::notice::{ImportNotice, ImportNoticeHandle};
use crate::import::service::MonitorError;
use crate::import::status::{ImportStatusTracker, StatusSnapshot};
use crate::import::types::{ImportEvent, MonitorRequest};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// Handle for the import monitor. Cheap to clone; all clones talk to
/// the same worker and registry.
#[derive(Clone)]
pub struct ImportMonitorHandle {
    request_tx: mpsc::UnboundedSender<MonitorRequest>,
    notice_tx: mpsc::UnboundedSender<ImportNotice>,
    notice_handle: ImportNoticeHandle,
    jobs: Arc<Mutex<HashMap<String, ImportStatusTracker>>>,
}

impl ImportMonitorHandle {
    pub(crate) fn new(
        request_tx: mpsc::UnboundedSender<MonitorRequest>,
        notice_tx: mpsc::UnboundedSender<ImportNotice>,
        notice_handle: ImportNoticeHandle,
        jobs: Arc<Mutex<HashMap<String, ImportStatusTracker>>>,
    ) -> Self {
        Self {
            request_tx,
            notice_tx,
            notice_handle,
            jobs,
        }
    }

    /// Register a new import job and return its id. The job starts in
    /// the pending phase and stays registered until released.
    pub fn register_job(&self) -> String {
        let job_id = Uuid::new_v4().to_string();
        let tracker = ImportStatusTracker::new(job_id.clone(), self.notice_tx.clone());
        self.jobs.lock().unwrap().insert(job_id.clone(), tracker);
        info!("Registered import job {}", job_id);
        job_id
    }

    /// Queue a pipeline event for a job. Events are applied in delivery
    /// order by the monitor worker.
    pub fn deliver(&self, job_id: &str, event: ImportEvent) -> Result<(), MonitorError> {
        self.request_tx
            .send(MonitorRequest::Deliver {
                job_id: job_id.to_string(),
                event,
            })
            .map_err(|_| MonitorError::WorkerGone)
    }

    /// Direct access to a job's tracker for out-of-band operations
    /// (total size, callback, container announcements).
    pub fn tracker(&self, job_id: &str) -> Option<ImportStatusTracker> {
        self.jobs.lock().unwrap().get(job_id).cloned()
    }

    /// Cancel a job immediately, ahead of any queued events. Returns
    /// false when the job id is unknown.
    pub fn cancel(&self, job_id: &str) -> bool {
        match self.tracker(job_id) {
            Some(tracker) => {
                tracker.mark_cancelled();
                true
            }
            None => false,
        }
    }

    /// Mark a job as already processed. Returns false when the job id
    /// is unknown.
    pub fn mark_duplicate(&self, job_id: &str) -> bool {
        match self.tracker(job_id) {
            Some(tracker) => {
                tracker.mark_duplicate();
                true
            }
            None => false,
        }
    }

    /// Current status of a job, if registered.
    pub fn snapshot(&self, job_id: &str) -> Option<StatusSnapshot> {
        self.tracker(job_id).map(|tracker| tracker.snapshot())
    }

    /// Subscribe to notices for a specific job
    /// Returns a filtered receiver that yields only notices for the specified job
    pub fn subscribe_job(&self, job_id: String) -> mpsc::UnboundedReceiver<ImportNotice> {
        self.notice_handle.subscribe_job(job_id)
    }

    /// Subscribe to notices for every job
    pub fn subscribe_all(&self) -> mpsc::UnboundedReceiver<ImportNotice> {
        self.notice_handle.subscribe_all()
    }

    /// Drop a job from the registry. Events already queued for it are
    /// discarded by the worker when they surface.
    pub fn release_job(&self, job_id: &str) -> bool {
        self.jobs.lock().unwrap().remove(job_id).is_some()
    }

    /// Ask the monitor worker to exit. Registered jobs stay readable
    /// through existing tracker handles.
    pub fn shutdown(&self) {
        let _ = self.request_tx.send(MonitorRequest::Shutdown);
    }
}
