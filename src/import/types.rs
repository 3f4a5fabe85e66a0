use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Request sent to the monitor worker task.
#[derive(Debug)]
pub enum MonitorRequest {
    Deliver { job_id: String, event: ImportEvent },
    Shutdown,
}

/// Lifecycle events emitted by the import pipeline for one job.
///
/// The pipeline delivers these strictly ordered per job; the tracker
/// applies them one at a time. Serde derives exist so recorded sessions
/// can be replayed from a JSON-lines log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ImportEvent {
    /// The pipeline started scanning the fileset for import candidates.
    ScanStarted,
    /// Scan finished; the number of importable files is known.
    FileSetDetermined { file_count: usize },
    /// Upload of file bytes to the server has begun.
    UploadStarted,
    /// More bytes went out on the wire since the last report, with the
    /// pipeline's estimate of the remaining upload time.
    UploadBytesProgress { delta_bytes: u64, est_time_left_ms: u64 },
    /// A whole chunk was acknowledged by the server. `bytes` folds into
    /// the confirmed total; pending tick progress is discarded.
    UploadChunkComplete { bytes: u64 },
    /// All bytes are on the server; per-file digests are available.
    UploadEnd { checksums: ChecksumReport },
    MetadataImported,
    PixelDataProcessed,
    ThumbnailsGenerated,
    MetadataProcessed,
    /// Server-side processing finished and handed back the created
    /// object ids.
    ObjectsReturned { object_ids: Vec<u64> },
    /// A reader recognized the files but could not parse them.
    FileException {
        reader: String,
        files: Vec<PathBuf>,
        cause: String,
    },
    /// No reader recognized the input.
    UnknownFormat { cause: String },
    /// A support library required by the reader was absent.
    MissingLibrary { cause: String },
    /// Unexpected error inside the pipeline.
    InternalException {
        reader: Option<String>,
        files: Vec<PathBuf>,
        cause: String,
    },
}

/// Per-file content digests computed after upload, plus the files whose
/// digest did not match on the server side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChecksumReport {
    pub src_files: Vec<PathBuf>,
    pub checksums: Vec<String>,
    /// Index into `src_files` of each file that failed verification,
    /// mapped to the digest the server expected.
    pub failing_checksums: HashMap<usize, String>,
}

impl ChecksumReport {
    pub fn has_failures(&self) -> bool {
        !self.failing_checksums.is_empty()
    }
}

/// Why an import job failed.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ImportFailure {
    #[error("{reader} could not read the file(s): {cause}")]
    FileRead {
        reader: String,
        files: Vec<PathBuf>,
        cause: String,
    },
    #[error("Unknown format: {cause}")]
    UnknownFormat { cause: String },
    #[error("Missing required library: {cause}")]
    MissingDependency { cause: String },
    #[error("Import failed: {cause}")]
    Internal {
        reader: Option<String>,
        files: Vec<PathBuf>,
        cause: String,
    },
}

/// Final result of an import job. Written at most once; later events
/// never overwrite it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ImportOutcome {
    Pending,
    Failed(ImportFailure),
    Succeeded(Vec<u64>),
    /// Folder imports hand back a server-side callback instead of
    /// object ids; the objects arrive later through it.
    AwaitingCallback(CallbackRef),
}

impl ImportOutcome {
    /// True once the outcome has been written (anything but `Pending`).
    pub fn is_settled(&self) -> bool {
        !matches!(self, ImportOutcome::Pending)
    }
}

/// Opaque handle to a server-side import callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackRef(pub String);

/// Server-side container created to hold the imported objects when the
/// import targeted a folder rather than an existing container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerRef {
    pub id: i64,
    pub name: String,
}
