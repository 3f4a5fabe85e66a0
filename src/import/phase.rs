use serde::{Deserialize, Serialize};

/// Coarse-grained stage an import job is currently in.
///
/// The derived ordering is the pipeline ordering: a job moves forward
/// through `Pending..=Complete` and never backwards. The three trailing
/// variants are terminal and can be entered from any non-terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ImportPhase {
    /// Job registered, no pipeline event received yet.
    Pending,
    /// The pipeline is scanning the fileset for import candidates.
    Scanning,
    /// File bytes are being uploaded to the server.
    Uploading,
    /// Server-side metadata import has started.
    MetadataImporting,
    /// Pixel data is being processed server-side.
    PixelsProcessing,
    /// Thumbnails are being generated.
    ThumbnailsGenerating,
    /// Metadata post-processing.
    MetadataProcessing,
    /// The server is handing back the created objects.
    ObjectsReturned,
    Complete,
    Cancelled,
    Duplicate,
    Failed,
}

impl ImportPhase {
    /// Display label for the phase, resolved at compile time.
    pub fn label(self) -> &'static str {
        match self {
            ImportPhase::Pending => "Pending",
            ImportPhase::Scanning => "Scanning",
            ImportPhase::Uploading => "Uploading",
            ImportPhase::MetadataImporting => "Importing Metadata",
            ImportPhase::PixelsProcessing => "Processing Pixels",
            ImportPhase::ThumbnailsGenerating => "Generating Thumbnails",
            ImportPhase::MetadataProcessing => "Processing Metadata",
            ImportPhase::ObjectsReturned => "Generating Objects",
            ImportPhase::Complete => "Complete",
            ImportPhase::Cancelled => "Cancelled",
            ImportPhase::Duplicate => "Duplicate",
            ImportPhase::Failed => "Failed",
        }
    }

    /// Step number (1..=6) on the post-upload processing indicator, or
    /// `None` for phases before the upload has finished.
    pub fn processing_step(self) -> Option<u8> {
        match self {
            ImportPhase::MetadataImporting => Some(1),
            ImportPhase::PixelsProcessing => Some(2),
            ImportPhase::ThumbnailsGenerating => Some(3),
            ImportPhase::MetadataProcessing => Some(4),
            ImportPhase::ObjectsReturned => Some(5),
            ImportPhase::Complete => Some(6),
            _ => None,
        }
    }

    /// Total number of steps on the processing indicator.
    pub const PROCESSING_STEPS: u8 = 6;

    /// Whether the phase is one of the three terminal states. Pipeline
    /// events never move a job out of a terminal phase.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ImportPhase::Cancelled | ImportPhase::Duplicate | ImportPhase::Failed
        )
    }
}
