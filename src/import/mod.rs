// # Import Module
//
// Per-job import status tracking with focused, testable components:
//
// - **ImportPhase**: Ordered pipeline phases with display labels
// - **ImportStatusTracker**: Sequential per-job state machine
// - **ImportNoticeHandle**: Ordered fan-out of status notices
// - **ImportMonitor**: Job registry and event routing worker
// - **format**: Byte-count and time-left display helpers
//
// Public API:
// - `ImportMonitor`: Create and start the monitor
// - `ImportMonitorHandle`: Register jobs, deliver events, subscribe
// - `ImportEvent`: Pipeline lifecycle events
// - `ImportNotice`: Real-time status notices

pub mod format;
mod handle;
mod notice;
mod phase;
mod service;
mod status;
mod types;

// Public API exports
pub use handle::ImportMonitorHandle;
pub use notice::{ImportNotice, ImportNoticeHandle};
pub use phase::ImportPhase;
pub use service::{ImportMonitor, MonitorError};
pub use status::{ImportStatusTracker, StatusSnapshot};
pub use types::{
    CallbackRef, ChecksumReport, ContainerRef, ImportEvent, ImportFailure, ImportOutcome,
};
