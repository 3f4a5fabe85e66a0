//! Status lifecycle properties exercised through the public API:
//! write-once results, monotonic phases, cancellation precedence, and
//! byte accounting, plus a recorded-log replay round-trip.

use mikro::import::{
    ChecksumReport, ImportEvent, ImportFailure, ImportNotice, ImportOutcome, ImportPhase,
    ImportStatusTracker,
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use tokio::sync::mpsc::{self, UnboundedReceiver};

fn new_tracker(job: &str) -> (ImportStatusTracker, UnboundedReceiver<ImportNotice>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ImportStatusTracker::new(job.to_string(), tx), rx)
}

/// The full event sequence of a successful two-file import.
fn happy_path_events() -> Vec<ImportEvent> {
    vec![
        ImportEvent::ScanStarted,
        ImportEvent::FileSetDetermined { file_count: 2 },
        ImportEvent::UploadStarted,
        ImportEvent::UploadBytesProgress {
            delta_bytes: 400,
            est_time_left_ms: 2_000,
        },
        ImportEvent::UploadChunkComplete { bytes: 400 },
        ImportEvent::UploadBytesProgress {
            delta_bytes: 600,
            est_time_left_ms: 0,
        },
        ImportEvent::UploadEnd {
            checksums: ChecksumReport {
                src_files: vec![PathBuf::from("a.tif"), PathBuf::from("b.tif")],
                checksums: vec!["aaaa".to_string(), "bbbb".to_string()],
                failing_checksums: Default::default(),
            },
        },
        ImportEvent::MetadataImported,
        ImportEvent::PixelDataProcessed,
        ImportEvent::ThumbnailsGenerated,
        ImportEvent::MetadataProcessed,
        ImportEvent::ObjectsReturned {
            object_ids: vec![101, 102],
        },
    ]
}

#[test]
fn full_upload_shows_total_size() {
    // A total of 1000 bytes, covered exactly by two deltas
    let (tracker, _rx) = new_tracker("job-a");
    tracker.set_total_bytes(1000);
    tracker.apply(ImportEvent::UploadBytesProgress {
        delta_bytes: 400,
        est_time_left_ms: 0,
    });
    tracker.apply(ImportEvent::UploadBytesProgress {
        delta_bytes: 600,
        est_time_left_ms: 0,
    });
    let snap = tracker.snapshot();
    assert_eq!(snap.percent, 100);
    assert_eq!(snap.upload_label, "1000 B");
}

#[test]
fn reader_failure_captures_details() {
    let (tracker, _rx) = new_tracker("job-b");
    tracker.apply(ImportEvent::FileException {
        reader: "TIFFReader".to_string(),
        files: vec![PathBuf::from("a.tif")],
        cause: "truncated IFD".to_string(),
    });
    let snap = tracker.snapshot();
    assert!(matches!(
        snap.outcome,
        ImportOutcome::Failed(ImportFailure::FileRead { .. })
    ));
    assert!(!snap.cancellable);
    assert_eq!(snap.reader_type.as_deref(), Some("TIFFReader"));
    assert_eq!(snap.used_files, vec![PathBuf::from("a.tif")]);
}

#[test]
fn success_survives_late_events() {
    let (tracker, _rx) = new_tracker("job-c");
    tracker.apply(ImportEvent::ObjectsReturned {
        object_ids: vec![1, 2, 3],
    });
    tracker.apply(ImportEvent::UploadBytesProgress {
        delta_bytes: 50,
        est_time_left_ms: 0,
    });
    let snap = tracker.snapshot();
    assert_eq!(snap.phase, ImportPhase::Complete);
    match snap.outcome {
        ImportOutcome::Succeeded(ids) => assert_eq!(ids, vec![1, 2, 3]),
        other => panic!("Expected Succeeded, got {:?}", other),
    }
}

#[test]
fn empty_fileset_progress_is_harmless() {
    // No files means totalBytes stays 0; progress events must not fault
    let (tracker, _rx) = new_tracker("job-d");
    tracker.apply(ImportEvent::FileSetDetermined { file_count: 0 });
    tracker.apply(ImportEvent::UploadBytesProgress {
        delta_bytes: 10,
        est_time_left_ms: 0,
    });
    tracker.apply(ImportEvent::UploadBytesProgress {
        delta_bytes: 90,
        est_time_left_ms: 0,
    });
    let snap = tracker.snapshot();
    assert_eq!(snap.percent, 0);
    assert_eq!(snap.summary, "No Files to Import.");
}

#[test]
fn cancel_blocks_phase_advancement() {
    let (tracker, _rx) = new_tracker("job-e");
    tracker.mark_cancelled();
    tracker.apply(ImportEvent::MetadataImported);
    assert_eq!(tracker.snapshot().phase, ImportPhase::Cancelled);
}

#[test]
fn cancel_sticks_at_every_point_in_the_stream() {
    let events = happy_path_events();
    for cut in 0..=events.len() {
        let (tracker, _rx) = new_tracker("job-f");
        for event in &events[..cut] {
            tracker.apply(event.clone());
        }
        tracker.mark_cancelled();
        for event in &events[cut..] {
            tracker.apply(event.clone());
        }
        assert_eq!(
            tracker.snapshot().phase,
            ImportPhase::Cancelled,
            "Cancellation after {} event(s) did not stick",
            cut
        );
    }
}

#[test]
fn result_is_written_at_most_once() {
    // Failure first: the later success keeps the failure
    let (tracker, _rx) = new_tracker("job-g");
    tracker.apply(ImportEvent::UnknownFormat {
        cause: "no reader matched".to_string(),
    });
    tracker.apply(ImportEvent::ObjectsReturned {
        object_ids: vec![9],
    });
    assert!(matches!(
        tracker.snapshot().outcome,
        ImportOutcome::Failed(ImportFailure::UnknownFormat { .. })
    ));

    // Success first: the later failure is absorbed
    let (tracker, _rx) = new_tracker("job-h");
    tracker.apply(ImportEvent::ObjectsReturned {
        object_ids: vec![9],
    });
    tracker.apply(ImportEvent::UnknownFormat {
        cause: "late".to_string(),
    });
    assert!(matches!(
        tracker.snapshot().outcome,
        ImportOutcome::Succeeded(_)
    ));
}

#[test]
fn phases_never_regress_on_the_happy_path() {
    let (tracker, _rx) = new_tracker("job-i");
    let mut previous = tracker.snapshot().phase;
    for event in happy_path_events() {
        tracker.apply(event);
        let current = tracker.snapshot().phase;
        assert!(
            previous <= current,
            "Phase regressed from {:?} to {:?}",
            previous,
            current
        );
        previous = current;
    }
    assert_eq!(previous, ImportPhase::Complete);
}

#[test]
fn uploaded_bytes_stay_bounded_by_total() {
    let (tracker, _rx) = new_tracker("job-j");
    tracker.set_total_bytes(500);
    for _ in 0..10 {
        tracker.apply(ImportEvent::UploadBytesProgress {
            delta_bytes: 100,
            est_time_left_ms: 0,
        });
        let snap = tracker.snapshot();
        assert!(
            snap.uploaded_bytes <= snap.total_bytes,
            "{} bytes reported against a total of {}",
            snap.uploaded_bytes,
            snap.total_bytes
        );
    }
    assert_eq!(tracker.snapshot().percent, 100);
}

#[test]
fn duplicate_marking_is_idempotent() {
    let (tracker, _rx) = new_tracker("job-k");
    tracker.mark_duplicate();
    let once = tracker.snapshot();
    tracker.mark_duplicate();
    let twice = tracker.snapshot();
    assert_eq!(once.phase, twice.phase);
    assert_eq!(once.summary, twice.summary);
    assert_eq!(twice.summary, "Already processed, skipping");
    assert_eq!(twice.phase, ImportPhase::Duplicate);
}

#[test]
fn notices_arrive_in_application_order() {
    let (tracker, mut rx) = new_tracker("job-l");
    for event in happy_path_events() {
        tracker.apply(event);
    }
    let mut names = Vec::new();
    while let Ok(notice) = rx.try_recv() {
        assert_eq!(notice.job_id(), "job-l");
        names.push(notice.name());
    }
    assert_eq!(
        names,
        vec!["scanning", "filesSet", "importStarted", "importDone"]
    );
}

#[test]
fn replayed_event_log_matches_live_run() {
    // Serialize a session to JSON lines, read it back, and replay it:
    // the replayed tracker must land on exactly the same snapshot.
    let mut events = happy_path_events();
    // Exercise the error payloads in the log format too
    events.truncate(6);
    events.push(ImportEvent::InternalException {
        reader: Some("CZIReader".to_string()),
        files: vec![PathBuf::from("scan.czi")],
        cause: "stream closed".to_string(),
    });

    let dir = TempDir::new().expect("temp dir");
    let log_path = dir.path().join("session.jsonl");
    let mut log = String::new();
    for event in &events {
        log.push_str(&serde_json::to_string(event).expect("serialize event"));
        log.push('\n');
    }
    fs::write(&log_path, log).expect("write event log");

    let (live, _rx) = new_tracker("replay");
    live.set_total_bytes(1000);
    for event in events {
        live.apply(event);
    }

    let (replayed, _rx) = new_tracker("replay");
    replayed.set_total_bytes(1000);
    for line in fs::read_to_string(&log_path).expect("read log").lines() {
        let event: ImportEvent = serde_json::from_str(line).expect("parse event line");
        replayed.apply(event);
    }

    let live_value = serde_json::to_value(live.snapshot()).expect("serialize snapshot");
    let replayed_value = serde_json::to_value(replayed.snapshot()).expect("serialize snapshot");
    assert_eq!(live_value, replayed_value);
}
