//! hanzi-ink CLI: replay recorded strokes and print candidates.
//!
//! Usage:
//!   hanzi-ink <strokes.json> [--preprocessed <out.png>]
//!
//! `strokes.json` is an array of strokes, each an array of `{"x":..,"y":..}`
//! points in canvas coordinates.

use hanzi_ink::{preprocess, EventSink, Point, RecognitionError, RecognizerConfig, SessionEvent};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

/// Logs events; the CLI prints the outcome itself.
struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: SessionEvent) {
        match serde_json::to_string(&event) {
            Ok(json) => log::debug!("[EVENT] {}", json),
            Err(e) => log::warn!("[EVENT] Unserializable event: {}", e),
        }
    }
}

struct Args {
    strokes_path: String,
    preprocessed_out: Option<String>,
}

fn parse_args() -> Option<Args> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut strokes_path = None;
    let mut preprocessed_out = None;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--preprocessed" {
            preprocessed_out = Some(iter.next()?);
        } else if strokes_path.is_none() {
            strokes_path = Some(arg);
        } else {
            return None;
        }
    }

    Some(Args {
        strokes_path: strokes_path?,
        preprocessed_out,
    })
}

fn read_strokes(path: &str) -> Result<Vec<Vec<Point>>, String> {
    let raw = std::fs::read_to_string(path).map_err(|e| format!("Cannot read {}: {}", path, e))?;
    serde_json::from_str(&raw).map_err(|e| format!("Invalid strokes in {}: {}", path, e))
}

#[tokio::main]
async fn main() -> ExitCode {
    hanzi_ink::init();

    let Some(args) = parse_args() else {
        eprintln!("Usage:");
        eprintln!("  hanzi-ink <strokes.json> [--preprocessed <out.png>]");
        return ExitCode::from(2);
    };

    let strokes = match read_strokes(&args.strokes_path) {
        Ok(strokes) => strokes,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = RecognizerConfig::load();
    let engine = hanzi_ink::tesseract_engine(&config);
    let session = match hanzi_ink::open_session(&config, engine, Arc::new(LogSink)) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Failed to start session: {}", e);
            return ExitCode::FAILURE;
        }
    };

    for stroke in strokes {
        let mut points = stroke.into_iter();
        let Some(first) = points.next() else {
            continue;
        };
        session.begin_stroke(first);
        for point in points {
            session.extend_stroke(point);
        }
        session.end_stroke();
    }

    if let Some(out) = &args.preprocessed_out {
        let processed = preprocess::preprocess(&session.snapshot());
        match processed.save(out) {
            Ok(()) => eprintln!("Preprocessed raster written to {}", out),
            Err(e) => eprintln!("Failed to write {}: {}", out, e),
        }
    }

    let start = Instant::now();
    let outcome = session.recognize().await;
    let elapsed_ms = start.elapsed().as_millis();

    match outcome {
        Ok(Some(set)) => {
            println!("{}", set.chars());
            for (rank, candidate) in set.candidates().iter().enumerate() {
                match candidate.confidence {
                    Some(confidence) => eprintln!(
                        "  {:>2}. {} {:.3} ({:?})",
                        rank + 1,
                        candidate.ch,
                        confidence,
                        candidate.source
                    ),
                    None => eprintln!("  {:>2}. {} ({:?})", rank + 1, candidate.ch, candidate.source),
                }
            }
            eprintln!("Recognized in {}ms", elapsed_ms);
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::FAILURE,
        Err(RecognitionError::EmptyInput) => {
            eprintln!("Nothing drawn");
            ExitCode::FAILURE
        }
        Err(e) if e.requires_manual_entry() => {
            eprintln!("Recognition failed ({}). Type the character instead.", e);
            ExitCode::from(3)
        }
        Err(e) => {
            eprintln!("Recognition failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
