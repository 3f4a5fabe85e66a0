use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tracing::{error, info};

use mikro::import::{ImportEvent, ImportStatusTracker};

/// Replays a recorded pipeline session (one JSON event per line)
/// through a fresh status tracker, logging every notice and printing
/// the final status snapshot. Useful for debugging event logs captured
/// from misbehaving imports.
fn main() {
    // Use RUST_LOG env var if set, otherwise default to info level for detailed output
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(log_filter).init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    let mut events_path: Option<PathBuf> = None;
    let mut total_bytes: Option<u64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--events" => {
                if i + 1 >= args.len() {
                    error!("--events requires a file path");
                    print_usage(&args[0]);
                    std::process::exit(1);
                }
                events_path = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--total-bytes" => {
                if i + 1 >= args.len() {
                    error!("--total-bytes requires a byte count");
                    print_usage(&args[0]);
                    std::process::exit(1);
                }
                match args[i + 1].parse::<u64>() {
                    Ok(n) => total_bytes = Some(n),
                    Err(_) => {
                        error!("Invalid byte count: {}", args[i + 1]);
                        std::process::exit(1);
                    }
                }
                i += 2;
            }
            _ => {
                error!("Unknown argument: {}", args[i]);
                print_usage(&args[0]);
                std::process::exit(1);
            }
        }
    }

    let events_path = match events_path {
        Some(path) => path,
        None => {
            error!("No event log specified");
            print_usage(&args[0]);
            std::process::exit(1);
        }
    };
    if !events_path.exists() {
        error!("Event log not found: {}", events_path.display());
        std::process::exit(1);
    }

    let file = match File::open(&events_path) {
        Ok(file) => file,
        Err(e) => {
            error!("Failed to open {}: {}", events_path.display(), e);
            std::process::exit(1);
        }
    };

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let tracker = ImportStatusTracker::new("replay".to_string(), tx);

    if let Some(total) = total_bytes {
        tracker.set_total_bytes(total);
    }

    info!("Replaying {}", events_path.display());

    let mut applied = 0usize;
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read line {}: {}", line_no + 1, e);
                std::process::exit(1);
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let event: ImportEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                error!("Bad event on line {}: {}", line_no + 1, e);
                std::process::exit(1);
            }
        };

        tracker.apply(event);
        applied += 1;

        // Notices come out in application order; show them as they fire
        while let Ok(notice) = rx.try_recv() {
            info!("Notice after line {}: {}", line_no + 1, notice.name());
        }
    }

    let snapshot = tracker.snapshot();
    info!(
        "Applied {} event(s); final phase {} ({}%)",
        applied,
        snapshot.phase.label(),
        snapshot.percent
    );

    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("Failed to serialize snapshot: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_usage(program_name: &str) {
    eprintln!("Usage:");
    eprintln!(
        "  {} --events <events.jsonl> [--total-bytes <n>]",
        program_name
    );
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} --events session.jsonl", program_name);
    eprintln!(
        "  {} --events session.jsonl --total-bytes 1048576",
        program_name
    );
}
