// # Import Monitor - Job Registry and Event Routing
//
// Owns the set of live import jobs and routes pipeline events to the
// right tracker. Events travel through a single request channel and are
// applied by one worker task, which keeps per-job application strictly
// sequential. Cancellation does not go through the queue: the handle
// reaches the tracker directly, so a cancel is never stuck behind
// undelivered events.

use crate::import::handle::ImportMonitorHandle;
use crate::import::notice::ImportNoticeHandle;
use crate::import::status::ImportStatusTracker;
use crate::import::types::MonitorRequest;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Import monitor worker is no longer running")]
    WorkerGone,
}

/// Monitor service owning the job registry and the event worker.
pub struct ImportMonitor {
    jobs: Arc<Mutex<HashMap<String, ImportStatusTracker>>>,
    request_rx: mpsc::UnboundedReceiver<MonitorRequest>,
}

impl ImportMonitor {
    /// Start the monitor worker and the notice dispatch task, returning
    /// the handle used to register jobs and deliver events.
    pub fn start(runtime_handle: tokio::runtime::Handle) -> ImportMonitorHandle {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        let jobs: Arc<Mutex<HashMap<String, ImportStatusTracker>>> =
            Arc::new(Mutex::new(HashMap::new()));

        let monitor = ImportMonitor {
            jobs: jobs.clone(),
            request_rx,
        };

        // Spawn the event worker on the shared runtime
        runtime_handle.spawn(monitor.listen_for_requests());

        let notice_handle = ImportNoticeHandle::new(notice_rx, runtime_handle);

        ImportMonitorHandle::new(request_tx, notice_tx, notice_handle, jobs)
    }

    async fn listen_for_requests(mut self) {
        info!("Import monitor worker started");

        loop {
            match self.request_rx.recv().await {
                Some(MonitorRequest::Deliver { job_id, event }) => {
                    let tracker = self.jobs.lock().unwrap().get(&job_id).cloned();
                    match tracker {
                        Some(tracker) => tracker.apply(event),
                        None => warn!("Dropping event for unknown job {}: {:?}", job_id, event),
                    }
                }
                Some(MonitorRequest::Shutdown) => {
                    info!("Import monitor shutting down");
                    break;
                }
                None => {
                    info!("Import monitor request channel closed");
                    break;
                }
            }
        }
    }
}
