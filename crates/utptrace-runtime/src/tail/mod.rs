//! The live log tailer.
//!
//! A single poll loop reads whatever the editor appended since the previous
//! tick and routes each complete line. Stopping is cooperative: the flag is
//! checked between ticks, after which one final read drains the file and the
//! table is drawn once in its settled state.

mod cursor;
mod router;

pub use cursor::TailCursor;

use crate::config::TailConfig;
use crate::sink::LogSink;
use crate::view::TimelineView;
use crate::{Error, Result};
use router::LineRouter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use utptrace_types::TelemetryRecord;

const SIDECAR_SUFFIX: &str = "-utp-json.log";
const UNLOCK_RETRY: Duration = Duration::from_millis(100);

/// What a finished tailing run observed
#[derive(Debug, Clone, Default)]
pub struct TailOutcome {
    /// Every telemetry record, in log order
    pub records: Vec<TelemetryRecord>,
    pub plain_lines_forwarded: usize,
    /// Telemetry lines whose payload could not be parsed
    pub dropped_lines: usize,
}

pub struct LogTailer {
    path: PathBuf,
    config: TailConfig,
    cursor: TailCursor,
    router: LineRouter,
}

impl LogTailer {
    pub fn new(
        path: impl Into<PathBuf>,
        config: TailConfig,
        sink: Box<dyn LogSink>,
        view: Box<dyn TimelineView>,
    ) -> Self {
        let router = LineRouter::new(&config, sink, view);
        Self {
            path: path.into(),
            config,
            cursor: TailCursor::new(),
            router,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// One poll: read new bytes and route every complete line
    pub fn tick(&mut self) {
        match self.cursor.poll(&self.path) {
            Ok(lines) => self.route_lines(&lines),
            Err(err) => self
                .router
                .warn(&format!("Failed to read {}: {}", self.path.display(), err)),
        }
    }

    /// Poll until `stop` is set, then drain the file
    pub fn run(mut self, stop: &AtomicBool) -> TailOutcome {
        while !stop.load(Ordering::SeqCst) {
            self.tick();
            std::thread::sleep(self.config.poll_interval);
        }
        self.finish()
    }

    /// Final flush: wait for the writer, read the rest, and render the last table
    pub fn finish(mut self) -> TailOutcome {
        if !wait_for_unlock(&self.path, self.config.unlock_timeout) {
            self.router.warn(&format!(
                "{} is still locked after {:?}; reading anyway",
                self.path.display(),
                self.config.unlock_timeout
            ));
        }

        self.router.defer_renders();
        self.tick();
        if let Some(line) = self.cursor.take_partial_line() {
            self.router.route_line(&line);
        }
        self.router.finish();

        if self.config.write_sidecar {
            let target = sidecar_path(&self.path);
            if let Err(err) = write_sidecar(&target, self.router.records()) {
                self.router.warn(&format!(
                    "Failed to write telemetry to {}: {}",
                    target.display(),
                    err
                ));
            }
        }

        let (records, plain_lines_forwarded, dropped_lines) = self.router.into_parts();
        TailOutcome {
            records,
            plain_lines_forwarded,
            dropped_lines,
        }
    }

    /// Run the poll loop on its own thread
    pub fn spawn(self) -> Result<TailHandle> {
        self.spawn_with_stop(Arc::new(AtomicBool::new(false)))
    }

    /// Like [`spawn`](Self::spawn), watching an existing flag. A flag that is
    /// already set skips straight to the final drain.
    pub fn spawn_with_stop(self, stop: Arc<AtomicBool>) -> Result<TailHandle> {
        let flag = stop.clone();
        let handle = std::thread::Builder::new()
            .name("utptrace-tailer".to_string())
            .spawn(move || self.run(&flag))?;

        Ok(TailHandle { stop, handle })
    }

    fn route_lines(&mut self, lines: &[String]) {
        if lines.is_empty() {
            return;
        }
        for line in lines {
            self.router.route_line(line);
        }
        self.router.end_batch();
    }
}

/// A tailer running in the background
pub struct TailHandle {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<TailOutcome>,
}

impl TailHandle {
    /// Ask the tailer to finish after its current tick
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Shared stop flag, for wiring into signal handlers
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the final flush and collect the outcome
    pub fn join(self) -> Result<TailOutcome> {
        self.handle.join().map_err(|panic| {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Error::Worker(message)
        })
    }
}

/// `<dir>/<stem>-utp-json.log` next to the tailed log
pub fn sidecar_path(log_path: &Path) -> PathBuf {
    let stem = log_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "telemetry".to_string());
    log_path.with_file_name(format!("{}{}", stem, SIDECAR_SUFFIX))
}

fn write_sidecar(path: &Path, records: &[TelemetryRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Wait until the writer releases its exclusive lock, giving up after `timeout`
fn wait_for_unlock(path: &Path, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while is_locked(path) {
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(UNLOCK_RETRY);
    }
    true
}

fn is_locked(path: &Path) -> bool {
    match std::fs::OpenOptions::new().read(true).write(true).open(path) {
        Ok(_) => false,
        Err(err) => is_sharing_violation(&err),
    }
}

#[cfg(windows)]
fn is_sharing_violation(err: &std::io::Error) -> bool {
    // ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
    matches!(err.raw_os_error(), Some(32) | Some(33))
}

#[cfg(not(windows))]
fn is_sharing_violation(_err: &std::io::Error) -> bool {
    false
}
