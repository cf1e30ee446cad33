//! Background parse worker
//!
//! Runs one interpreter pass on its own thread and hands progress and the
//! finished [`ParseResult`] back over channels. Only one pass may run at a
//! time per worker.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use sparktimer_core::{cancel_flag, AppEvent, CancelFlag, EventBus, FileEvent, WorkerError};
use tracing::{error, info, warn};

use super::estimator::TimeEstimator;
use super::interpreter::{DiagnosticKind, LineInterpreter, ParseResult};
use crate::utils::file_io::LayerFileReader;

/// Releases the busy flag when dropped
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Starts parse passes on a background thread
#[derive(Debug, Clone, Default)]
pub struct ParseWorker {
    busy: Arc<AtomicBool>,
    estimator: TimeEstimator,
    event_bus: Option<Arc<EventBus>>,
}

impl ParseWorker {
    pub fn new(estimator: TimeEstimator) -> Self {
        Self {
            busy: Arc::new(AtomicBool::new(false)),
            estimator,
            event_bus: None,
        }
    }

    /// Publish file events on `bus`
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Whether a pass is currently running
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Parse the file at `path` in the background
    ///
    /// A file that cannot be opened still produces a result, carrying a
    /// single `ReadFailure` diagnostic at line 0.
    pub fn start(&self, path: impl AsRef<Path>) -> Result<ParseHandle, WorkerError> {
        let path = path.as_ref().to_path_buf();
        let guard = self.acquire(&path)?;

        Ok(self.spawn(guard, move |interpreter, progress, bus| {
            let (reader, total) = match open_counted(&path) {
                Ok(opened) => opened,
                Err(e) => return open_failure(&path, e.to_string(), progress),
            };
            publish(bus, FileEvent::Opened { path, lines: total });
            interpreter.interpret(reader, Some(total), progress)
        }))
    }

    /// Parse an already opened stream in the background
    ///
    /// `label` identifies the source in events and logs.
    pub fn start_reader<R>(
        &self,
        label: impl Into<PathBuf>,
        reader: R,
        total_lines: Option<usize>,
    ) -> Result<ParseHandle, WorkerError>
    where
        R: BufRead + Send + 'static,
    {
        let path = label.into();
        let guard = self.acquire(&path)?;

        Ok(self.spawn(guard, move |interpreter, progress, bus| {
            publish(
                bus,
                FileEvent::Opened {
                    path,
                    lines: total_lines.unwrap_or(0),
                },
            );
            interpreter.interpret(reader, total_lines, progress)
        }))
    }

    fn acquire(&self, path: &Path) -> Result<BusyGuard, WorkerError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Rejected {}: a file is already being processed", path.display());
            publish(
                self.event_bus.as_deref(),
                FileEvent::Rejected {
                    path: path.to_path_buf(),
                },
            );
            return Err(WorkerError::Busy);
        }
        Ok(BusyGuard(Arc::clone(&self.busy)))
    }

    fn spawn<F>(&self, guard: BusyGuard, pass: F) -> ParseHandle
    where
        F: FnOnce(LineInterpreter, &mut dyn FnMut(u8), Option<&EventBus>) -> ParseResult
            + Send
            + 'static,
    {
        let (progress_tx, progress_rx) = mpsc::channel();
        let (result_tx, result_rx) = mpsc::channel();
        let cancel = cancel_flag();

        let interpreter =
            LineInterpreter::new(self.estimator).with_cancel_flag(Arc::clone(&cancel));
        let bus = self.event_bus.clone();

        let thread = thread::spawn(move || {
            let started = Instant::now();
            let bus = bus.as_deref();
            let mut report = |percent: u8| forward_progress(&progress_tx, bus, percent);

            let result = pass(interpreter, &mut report, bus);
            publish_outcome(bus, &result, started);

            drop(guard);
            let _ = result_tx.send(result);
        });

        ParseHandle {
            progress_rx,
            result_rx,
            cancel,
            thread: Some(thread),
        }
    }
}

fn open_counted(path: &Path) -> sparktimer_core::Result<(BufReader<File>, usize)> {
    let reader = LayerFileReader::new(path)?;
    let total = reader.count_lines()?;
    let stream = reader.open()?;
    Ok((stream, total))
}

fn open_failure(
    path: &Path,
    message: String,
    progress: &mut dyn FnMut(u8),
) -> ParseResult {
    error!("Cannot open {}: {}", path.display(), message);
    let mut result = ParseResult::new();
    result.record(0, DiagnosticKind::ReadFailure, message);
    progress(100);
    result
}

fn forward_progress(tx: &Sender<u8>, bus: Option<&EventBus>, percent: u8) {
    let _ = tx.send(percent);
    publish(bus, FileEvent::Progress { percent });
}

fn publish_outcome(bus: Option<&EventBus>, result: &ParseResult, started: Instant) {
    let failure = result
        .diagnostics
        .iter()
        .find(|d| d.kind == DiagnosticKind::ReadFailure);

    let event = if let Some(failure) = failure {
        FileEvent::ReadFailed {
            line: failure.line,
            error: failure.text.clone(),
        }
    } else if result.cancelled {
        FileEvent::Cancelled {
            lines_read: result.lines_read,
        }
    } else {
        FileEvent::Completed {
            layers: result.layers.len(),
            seconds: result.accumulated_seconds,
            has_errors: result.has_errors,
            duration: started.elapsed(),
        }
    };

    info!("Parse pass finished: {}", AppEvent::File(event.clone()).description());
    publish(bus, event);
}

fn publish(bus: Option<&EventBus>, event: FileEvent) {
    if let Some(bus) = bus {
        let _ = bus.publish(AppEvent::File(event));
    }
}

/// Handle to a running parse pass
#[derive(Debug)]
pub struct ParseHandle {
    progress_rx: Receiver<u8>,
    result_rx: Receiver<ParseResult>,
    cancel: CancelFlag,
    thread: Option<JoinHandle<()>>,
}

impl ParseHandle {
    /// Ask the pass to stop before its next line
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        Arc::clone(&self.cancel)
    }

    /// Finished result, or `None` while the pass is still running
    pub fn try_result(&mut self) -> Result<Option<ParseResult>, WorkerError> {
        match self.result_rx.try_recv() {
            Ok(result) => {
                self.join();
                Ok(Some(result))
            }
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(WorkerError::Disconnected),
        }
    }

    /// Block until the pass finishes
    pub fn wait(self) -> Result<ParseResult, WorkerError> {
        self.wait_with_progress(|_| {})
    }

    /// Block until the pass finishes, forwarding every progress update
    pub fn wait_with_progress<F>(mut self, mut on_progress: F) -> Result<ParseResult, WorkerError>
    where
        F: FnMut(u8),
    {
        // Ends once the worker drops its sender.
        for percent in self.progress_rx.iter() {
            on_progress(percent);
        }

        let result = self
            .result_rx
            .recv()
            .map_err(|_| WorkerError::Disconnected)?;
        self.join();
        Ok(result)
    }

    fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Parse worker thread panicked");
            }
        }
    }
}
