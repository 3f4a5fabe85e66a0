// # Import Status Tracker
//
// Sequential state machine for one import job. The pipeline's ordered
// event stream is reduced into a phase, upload byte counters, and a
// write-once outcome; discrete transitions go out as typed notices.
//
// One tracker per job; jobs never share state. All mutation happens
// under a single lock, so a concurrent cancellation is observed before
// the next phase transition rather than racing it.

use crate::import::format::{display_size, format_time_left, format_upload, scaled, upload_percent};
use crate::import::notice::ImportNotice;
use crate::import::phase::ImportPhase;
use crate::import::types::{
    CallbackRef, ChecksumReport, ContainerRef, ImportEvent, ImportFailure, ImportOutcome,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc as tokio_mpsc;
use tracing::{info, trace, warn};

/// User-visible status line texts.
const PENDING_TEXT: &str = "Pending...";
const SCANNING_TEXT: &str = "Scanning...";
const CANCEL_TEXT: &str = "cancelled";
const DUPLICATE_TEXT: &str = "Already processed, skipping";
const NO_FILES_TEXT: &str = "No Files to Import.";

/// Reduces the ordered event stream of one import job into its current
/// status and emits notices on discrete transitions.
///
/// Encapsulates:
/// - Phase progression (monotonic, halted by cancel/duplicate/failure)
/// - Upload byte accounting (confirmed chunks plus in-flight tick bytes)
/// - The write-once outcome and error details
/// - Notice transmission
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ImportStatusTracker {
    job_id: String,
    state: Arc<Mutex<StatusState>>,
    tx: tokio_mpsc::UnboundedSender<ImportNotice>,
}

struct StatusState {
    phase: ImportPhase,
    summary: String,
    total_bytes: u64,
    total_display: String,
    total_unit: Option<&'static str>,
    /// Bytes acknowledged by the server (whole chunks).
    confirmed_bytes: u64,
    /// Bytes reported on the wire since the last chunk acknowledgment.
    tick_bytes: u64,
    upload_label: String,
    cancellable: bool,
    cancelled: bool,
    duplicate: bool,
    reader_type: Option<String>,
    used_files: Vec<PathBuf>,
    checksums: Option<ChecksumReport>,
    outcome: ImportOutcome,
    hcs: bool,
    fileset_id: Option<i64>,
}

impl StatusState {
    fn new() -> Self {
        Self {
            phase: ImportPhase::Pending,
            summary: PENDING_TEXT.to_string(),
            total_bytes: 0,
            total_display: String::new(),
            total_unit: None,
            confirmed_bytes: 0,
            tick_bytes: 0,
            upload_label: String::new(),
            cancellable: true,
            cancelled: false,
            duplicate: false,
            reader_type: None,
            used_files: Vec::new(),
            checksums: None,
            outcome: ImportOutcome::Pending,
            hcs: false,
            fileset_id: None,
        }
    }

    fn failed(&self) -> bool {
        matches!(self.outcome, ImportOutcome::Failed(_))
    }

    /// Move the phase forward. Refused once the job is cancelled,
    /// duplicate, or failed, and never moves backwards, so re-delivered
    /// events cannot regress the display.
    fn advance(&mut self, target: ImportPhase) -> bool {
        if self.cancelled || self.duplicate || self.failed() {
            return false;
        }
        if target > self.phase {
            self.phase = target;
            true
        } else {
            false
        }
    }

    /// Effective uploaded byte count: confirmed chunks plus the current
    /// tick, clamped to the total once the total is known.
    fn uploaded_bytes(&self) -> u64 {
        let sum = self.confirmed_bytes.saturating_add(self.tick_bytes);
        if self.total_bytes > 0 {
            sum.min(self.total_bytes)
        } else {
            sum
        }
    }
}

impl ImportStatusTracker {
    /// Create a tracker for one job. Notices go out on `tx` in the exact
    /// order operations were applied.
    pub fn new(job_id: String, tx: tokio_mpsc::UnboundedSender<ImportNotice>) -> Self {
        Self {
            job_id,
            state: Arc::new(Mutex::new(StatusState::new())),
            tx,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Apply the next pipeline event. Total over all event kinds; never
    /// panics and never blocks on anything but the state lock.
    pub fn apply(&self, event: ImportEvent) {
        let mut st = self.state.lock().unwrap();
        match event {
            ImportEvent::ScanStarted => {
                if st.advance(ImportPhase::Scanning) {
                    st.summary = SCANNING_TEXT.to_string();
                }
                let _ = self.tx.send(ImportNotice::Scanning {
                    job_id: self.job_id.clone(),
                });
            }
            ImportEvent::FileSetDetermined { file_count } => {
                st.summary = match file_count {
                    0 => NO_FILES_TEXT.to_string(),
                    1 => "Importing 1 file".to_string(),
                    n => format!("Importing {} files", n),
                };
                let _ = self.tx.send(ImportNotice::FilesSet {
                    job_id: self.job_id.clone(),
                    file_count,
                });
            }
            ImportEvent::UploadStarted => {
                if st.advance(ImportPhase::Uploading) {
                    st.summary.clear();
                }
                let _ = self.tx.send(ImportNotice::ImportStarted {
                    job_id: self.job_id.clone(),
                });
            }
            ImportEvent::UploadBytesProgress {
                delta_bytes,
                est_time_left_ms,
            } => {
                // Late progress after a recorded failure is dropped
                if st.failed() {
                    return;
                }
                st.tick_bytes = st.tick_bytes.saturating_add(delta_bytes);
                let label = build_upload_label(&st, est_time_left_ms);
                st.upload_label = label;
                trace!(
                    "Job {} upload progress: {}/{} ({}%)",
                    self.job_id,
                    st.uploaded_bytes(),
                    st.total_bytes,
                    upload_percent(st.uploaded_bytes(), st.total_bytes)
                );
            }
            ImportEvent::UploadChunkComplete { bytes } => {
                if st.failed() {
                    return;
                }
                // The chunk supersedes the tick progress reported for it
                st.confirmed_bytes = st.confirmed_bytes.saturating_add(bytes);
                st.tick_bytes = 0;
            }
            ImportEvent::UploadEnd { checksums } => {
                if st.checksums.is_none() {
                    st.checksums = Some(checksums);
                }
                if st.advance(ImportPhase::MetadataImporting) {
                    st.summary = st.phase.label().to_string();
                }
            }
            ImportEvent::MetadataImported => {
                if st.advance(ImportPhase::PixelsProcessing) {
                    st.summary = st.phase.label().to_string();
                }
            }
            ImportEvent::PixelDataProcessed => {
                if st.advance(ImportPhase::ThumbnailsGenerating) {
                    st.summary = st.phase.label().to_string();
                }
            }
            ImportEvent::ThumbnailsGenerated => {
                if st.advance(ImportPhase::MetadataProcessing) {
                    st.summary = st.phase.label().to_string();
                }
            }
            ImportEvent::MetadataProcessed => {
                if st.advance(ImportPhase::ObjectsReturned) {
                    st.summary = st.phase.label().to_string();
                }
            }
            ImportEvent::ObjectsReturned { object_ids } => {
                let newly_settled = !st.outcome.is_settled();
                if newly_settled {
                    st.outcome = ImportOutcome::Succeeded(object_ids);
                }
                if st.advance(ImportPhase::Complete) {
                    st.summary = st.phase.label().to_string();
                }
                if newly_settled {
                    info!("Job {} complete", self.job_id);
                    let _ = self.tx.send(ImportNotice::ImportDone {
                        job_id: self.job_id.clone(),
                    });
                }
            }
            ImportEvent::FileException {
                reader,
                files,
                cause,
            } => {
                self.record_failure(
                    &mut st,
                    ImportFailure::FileRead {
                        reader,
                        files,
                        cause,
                    },
                );
            }
            ImportEvent::UnknownFormat { cause } => {
                self.record_failure(&mut st, ImportFailure::UnknownFormat { cause });
            }
            ImportEvent::MissingLibrary { cause } => {
                self.record_failure(&mut st, ImportFailure::MissingDependency { cause });
            }
            ImportEvent::InternalException {
                reader,
                files,
                cause,
            } => {
                self.record_failure(
                    &mut st,
                    ImportFailure::Internal {
                        reader,
                        files,
                        cause,
                    },
                );
            }
        }
    }

    /// Record a failure into the write-once outcome. A second failure
    /// (or a failure after success) is a full no-op.
    fn record_failure(&self, st: &mut StatusState, failure: ImportFailure) {
        if st.outcome.is_settled() {
            return;
        }
        st.cancellable = false;
        match &failure {
            ImportFailure::FileRead { reader, files, .. } => {
                st.reader_type = Some(reader.clone());
                st.used_files = files.clone();
            }
            ImportFailure::Internal { reader, files, .. } => {
                if let Some(reader) = reader {
                    st.reader_type = Some(reader.clone());
                }
                if !files.is_empty() {
                    st.used_files = files.clone();
                }
            }
            _ => {}
        }
        st.summary = failure.to_string();
        if !st.phase.is_terminal() {
            st.phase = ImportPhase::Failed;
        }
        warn!("Job {} failed: {}", self.job_id, failure);
        st.outcome = ImportOutcome::Failed(failure);
        let _ = self.tx.send(ImportNotice::Cancellable {
            job_id: self.job_id.clone(),
            cancellable: false,
        });
    }

    /// Mark the job cancelled. Safe to call from any thread at any time;
    /// takes the same lock as `apply`, so no in-flight event can advance
    /// the phase past the cancellation. Idempotent.
    pub fn mark_cancelled(&self) {
        let mut st = self.state.lock().unwrap();
        if st.cancelled {
            return;
        }
        st.cancelled = true;
        st.phase = ImportPhase::Cancelled;
        st.summary = CANCEL_TEXT.to_string();
        info!("Job {} cancelled", self.job_id);
        let _ = self.tx.send(ImportNotice::CancelledImport {
            job_id: self.job_id.clone(),
        });
    }

    /// Mark the job as already processed. Idempotent.
    pub fn mark_duplicate(&self) {
        let mut st = self.state.lock().unwrap();
        if st.duplicate {
            return;
        }
        st.duplicate = true;
        st.phase = ImportPhase::Duplicate;
        st.summary = DUPLICATE_TEXT.to_string();
    }

    /// Set the total upload size for the fileset. The byte count comes
    /// from the caller (file sizes are summed where the files live); the
    /// display string and unit derived here are carried into every
    /// subsequent upload label.
    pub fn set_total_bytes(&self, total: u64) {
        let mut st = self.state.lock().unwrap();
        st.total_bytes = total;
        st.total_display = display_size(total);
        let (_, unit) = scaled(total);
        st.total_unit = Some(unit);
    }

    /// Flag the fileset as a high-content screening acquisition.
    pub fn set_hcs(&self, hcs: bool) {
        self.state.lock().unwrap().hcs = hcs;
    }

    /// Record the server-side fileset id once the upload registered it.
    pub fn set_fileset_id(&self, id: i64) {
        self.state.lock().unwrap().fileset_id = Some(id);
    }

    /// Record the server-side callback for a folder import, or the
    /// failure that prevented one. Only invoked for folder imports.
    pub fn set_callback(&self, cmd: Result<CallbackRef, ImportFailure>) {
        let mut st = self.state.lock().unwrap();
        match cmd {
            Ok(callback) => {
                if !st.outcome.is_settled() {
                    st.outcome = ImportOutcome::AwaitingCallback(callback);
                }
            }
            Err(failure) => self.record_failure(&mut st, failure),
        }
        let _ = self.tx.send(ImportNotice::UploadDone {
            job_id: self.job_id.clone(),
        });
    }

    /// Announce that the original target container was reset.
    pub fn set_no_container(&self) {
        let _ = self.tx.send(ImportNotice::NoContainer {
            job_id: self.job_id.clone(),
        });
    }

    /// Announce the container created server-side from the source folder.
    pub fn set_container_from_folder(&self, container: ContainerRef) {
        let _ = self.tx.send(ImportNotice::ContainerFromFolder {
            job_id: self.job_id.clone(),
            container,
        });
    }

    /// Announce that `file` replaced the originally selected file. Used
    /// when the selection was an arbitrary member of the fileset (a
    /// sidecar file, say) and the scan picked the real candidate.
    pub fn reset_file(&self, file: PathBuf) {
        let _ = self.tx.send(ImportNotice::FileReset {
            job_id: self.job_id.clone(),
            file,
        });
    }

    /// Forward a debug line from the pipeline to subscribers.
    pub fn emit_debug(&self, text: String) {
        trace!("Job {}: {}", self.job_id, text);
        let _ = self.tx.send(ImportNotice::DebugText {
            job_id: self.job_id.clone(),
            text,
        });
    }

    /// Side-effect-free copy of the current status.
    pub fn snapshot(&self) -> StatusSnapshot {
        let st = self.state.lock().unwrap();
        StatusSnapshot {
            job_id: self.job_id.clone(),
            phase: st.phase,
            summary: st.summary.clone(),
            total_bytes: st.total_bytes,
            uploaded_bytes: st.uploaded_bytes(),
            percent: upload_percent(st.uploaded_bytes(), st.total_bytes),
            upload_label: st.upload_label.clone(),
            cancellable: st.cancellable,
            cancelled: st.cancelled,
            duplicate: st.duplicate,
            reader_type: st.reader_type.clone(),
            used_files: st.used_files.clone(),
            checksums: st.checksums.clone(),
            outcome: st.outcome.clone(),
            hcs: st.hcs,
            fileset_id: st.fileset_id,
        }
    }
}

/// Owned copy of a job's status at one point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub job_id: String,
    pub phase: ImportPhase,
    pub summary: String,
    pub total_bytes: u64,
    pub uploaded_bytes: u64,
    pub percent: u8,
    pub upload_label: String,
    pub cancellable: bool,
    pub cancelled: bool,
    pub duplicate: bool,
    pub reader_type: Option<String>,
    pub used_files: Vec<PathBuf>,
    pub checksums: Option<ChecksumReport>,
    pub outcome: ImportOutcome,
    pub hcs: bool,
    pub fileset_id: Option<i64>,
}

/// Build the upload progress string: partial/total while uploading, the
/// total alone once every byte is in, with the time-left estimate
/// appended when the pipeline supplied one.
fn build_upload_label(st: &StatusState, est_time_left_ms: u64) -> String {
    let uploaded = st.uploaded_bytes();
    let mut label = if st.total_bytes > 0 {
        if uploaded == st.total_bytes {
            st.total_display.clone()
        } else {
            match st.total_unit {
                Some(unit) => format_upload(uploaded, &st.total_display, unit),
                None => display_size(uploaded),
            }
        }
    } else {
        display_size(uploaded)
    };
    if est_time_left_ms > 0 {
        let remaining = format_time_left(est_time_left_ms);
        if remaining.is_empty() {
            label.push_str(" Almost complete");
        } else {
            label.push(' ');
            label.push_str(&remaining);
            label.push_str(" Left");
        }
    }
    label
}
