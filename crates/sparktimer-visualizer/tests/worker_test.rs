use std::io::{self, BufReader, Read, Write};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use sparktimer_core::{AppEvent, EventBus, EventFilter, FileEvent, WorkerError};
use sparktimer_visualizer::gcode::{DiagnosticKind, ParseWorker, TimeEstimator};

/// Serves one line per message; blocks until the test releases it
struct GatedReader {
    gate: Receiver<&'static [u8]>,
    pending: Vec<u8>,
}

impl Read for GatedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            match self.gate.recv() {
                Ok(chunk) => self.pending.extend_from_slice(chunk),
                Err(_) => return Ok(0),
            }
        }
        let n = self.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }
}

fn gated() -> (mpsc::Sender<&'static [u8]>, BufReader<GatedReader>) {
    let (tx, rx) = mpsc::channel();
    let reader = GatedReader {
        gate: rx,
        pending: Vec::new(),
    };
    (tx, BufReader::new(reader))
}

fn write_file(contents: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_parse_file_in_background() {
    let file = write_file(b";W:8\n;H:1\n;L:1\n{{\n\x01\n}}\nG4 S30\nG1 Z3 F180\n");
    let worker = ParseWorker::default();

    let mut progress = Vec::new();
    let result = worker
        .start(file.path())
        .unwrap()
        .wait_with_progress(|p| progress.push(p))
        .unwrap();

    assert_eq!(result.width, 8);
    assert_eq!(result.layers.len(), 1);
    assert_eq!(result.accumulated_seconds, 31.0);
    assert_eq!(result.lines_read, 8);
    assert!(!result.cancelled);

    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(progress.last(), Some(&100));
    assert!(!worker.is_busy());
}

#[test]
fn test_busy_guard_rejects_second_start() {
    let bus = Arc::new(EventBus::new());
    let (events_tx, events_rx) = mpsc::channel();
    bus.subscribe(EventFilter::All, move |event| {
        let _ = events_tx.send(event);
    });

    let worker = ParseWorker::default().with_event_bus(Arc::clone(&bus));
    let (gate, reader) = gated();

    let handle = worker.start_reader("first.gcode", reader, Some(2)).unwrap();
    assert!(worker.is_busy());

    let second = worker.start("second.gcode");
    assert!(matches!(second, Err(WorkerError::Busy)));

    gate.send(b"G4 S1\n").unwrap();
    gate.send(b"G4 S2\n").unwrap();
    drop(gate);

    let result = handle.wait().unwrap();
    assert_eq!(result.accumulated_seconds, 3.0);
    assert!(!worker.is_busy());

    let events: Vec<AppEvent> = events_rx.try_iter().collect();
    assert!(events.iter().any(|e| matches!(e, AppEvent::File(FileEvent::Rejected { .. }))));
    assert!(events.iter().any(|e| matches!(e, AppEvent::File(FileEvent::Completed { .. }))));

    // Released guard lets the next pass start
    let file = write_file(b"G4 S5\n");
    let result = worker.start(file.path()).unwrap().wait().unwrap();
    assert_eq!(result.accumulated_seconds, 5.0);
}

#[test]
fn test_cancel_returns_partial_result() {
    let worker = ParseWorker::new(TimeEstimator::default());
    let (gate, reader) = gated();

    let handle = worker.start_reader("slow.gcode", reader, Some(10)).unwrap();
    gate.send(b"G4 S7\n").unwrap();
    handle.cancel();
    // The pass may already have stopped and dropped the reader.
    let _ = gate.send(b"G4 S9\n");
    drop(gate);

    let mut progress = Vec::new();
    let result = handle.wait_with_progress(|p| progress.push(p)).unwrap();

    assert!(result.cancelled);
    assert!(result.lines_read <= 2);
    assert_eq!(progress.last(), Some(&100));
    assert!(!worker.is_busy());
}

#[test]
fn test_missing_file_yields_read_failure() {
    let worker = ParseWorker::default();
    let mut progress = Vec::new();
    let result = worker
        .start("/nonexistent/dir/part.gcode")
        .unwrap()
        .wait_with_progress(|p| progress.push(p))
        .unwrap();

    assert!(result.has_errors);
    assert_eq!(result.lines_read, 0);
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].kind, DiagnosticKind::ReadFailure);
    assert_eq!(result.diagnostics[0].line, 0);
    assert_eq!(progress, vec![100]);
}

#[test]
fn test_try_result_polling() {
    let file = write_file(b"G4 S2\n");
    let worker = ParseWorker::default();
    let mut handle = worker.start(file.path()).unwrap();

    let result = loop {
        if let Some(result) = handle.try_result().unwrap() {
            break result;
        }
        std::thread::sleep(std::time::Duration::from_millis(5));
    };
    assert_eq!(result.accumulated_seconds, 2.0);
}
