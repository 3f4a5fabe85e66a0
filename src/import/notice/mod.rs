// Status Notices
//
// Typed notifications emitted by the status tracker as it applies
// pipeline events. One variant per named transition; subscribers receive
// them in exactly the order the tracker applied the underlying events.

mod handle;

pub use handle::ImportNoticeHandle;

use crate::import::types::ContainerRef;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A discrete status transition of one import job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ImportNotice {
    /// The number of files in the fileset is known.
    FilesSet { job_id: String, file_count: usize },
    /// Upload has begun; progress indicators become meaningful.
    ImportStarted { job_id: String },
    Scanning { job_id: String },
    /// The job completed and its result is available.
    ImportDone { job_id: String },
    /// All bytes reached the server (folder imports: callback recorded).
    UploadDone { job_id: String },
    /// Whether the job can still be aborted changed.
    Cancellable { job_id: String, cancellable: bool },
    CancelledImport { job_id: String },
    /// The import produced no target container.
    NoContainer { job_id: String },
    /// A container was created server-side from the source folder.
    ContainerFromFolder {
        job_id: String,
        container: ContainerRef,
    },
    /// A file was returned to the import queue for another attempt.
    FileReset { job_id: String, file: PathBuf },
    DebugText { job_id: String, text: String },
}

impl ImportNotice {
    /// Stable name of the transition, matching the property names used
    /// by existing listeners.
    pub fn name(&self) -> &'static str {
        match self {
            ImportNotice::FilesSet { .. } => "filesSet",
            ImportNotice::ImportStarted { .. } => "importStarted",
            ImportNotice::Scanning { .. } => "scanning",
            ImportNotice::ImportDone { .. } => "importDone",
            ImportNotice::UploadDone { .. } => "uploadDone",
            ImportNotice::Cancellable { .. } => "cancellable",
            ImportNotice::CancelledImport { .. } => "cancelledImport",
            ImportNotice::NoContainer { .. } => "noContainer",
            ImportNotice::ContainerFromFolder { .. } => "containerFromFolder",
            ImportNotice::FileReset { .. } => "fileReset",
            ImportNotice::DebugText { .. } => "debugText",
        }
    }

    /// Id of the job the notice belongs to.
    pub fn job_id(&self) -> &str {
        match self {
            ImportNotice::FilesSet { job_id, .. }
            | ImportNotice::ImportStarted { job_id }
            | ImportNotice::Scanning { job_id }
            | ImportNotice::ImportDone { job_id }
            | ImportNotice::UploadDone { job_id }
            | ImportNotice::Cancellable { job_id, .. }
            | ImportNotice::CancelledImport { job_id }
            | ImportNotice::NoContainer { job_id }
            | ImportNotice::ContainerFromFolder { job_id, .. }
            | ImportNotice::FileReset { job_id, .. }
            | ImportNotice::DebugText { job_id, .. } => job_id,
        }
    }
}
