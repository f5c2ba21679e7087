use crate::config::TailConfig;
use crate::routing::{Route, SeverityPolicy};
use crate::sink::{AnnotationLevel, LogSink};
use crate::view::TimelineView;
use std::io;
use utptrace_engine::{ActionAccumulator, ActionTableSnapshot};
use utptrace_types::{
    MemoryLeakRecord, TelemetryRecord, parse_payload, sanitize, telemetry_payload,
};

/// Sends each complete log line to the sink, the accumulator, or both
pub(crate) struct LineRouter {
    sink: Box<dyn LogSink>,
    view: Box<dyn TimelineView>,
    policy: SeverityPolicy,
    accumulator: ActionAccumulator,
    records: Vec<TelemetryRecord>,
    telemetry_only: bool,
    plain_lines_forwarded: usize,
    dropped_lines: usize,
    /// The table was cleared for interleaved output and needs drawing again
    needs_restore: bool,
    /// Hold renders back until `finish` draws the settled table once
    deferred: bool,
    last_rendered: Option<ActionTableSnapshot>,
}

impl LineRouter {
    pub(crate) fn new(config: &TailConfig, sink: Box<dyn LogSink>, view: Box<dyn TimelineView>) -> Self {
        Self {
            sink,
            view,
            policy: SeverityPolicy::new(config.project_root.clone(), &config.downgraded_messages),
            accumulator: ActionAccumulator::new(),
            records: Vec::new(),
            telemetry_only: config.telemetry_only,
            plain_lines_forwarded: 0,
            dropped_lines: 0,
            needs_restore: false,
            deferred: false,
            last_rendered: None,
        }
    }

    /// Stop drawing per record; the final drain only shows its end state
    pub(crate) fn defer_renders(&mut self) {
        self.deferred = true;
    }

    pub(crate) fn route_line(&mut self, line: &str) {
        let Some(payload) = telemetry_payload(line) else {
            if !self.telemetry_only {
                self.emit_output(line);
                self.plain_lines_forwarded += 1;
            }
            return;
        };

        // Interleaved writers can leave nothing but control bytes behind the prefix
        let Some(payload) = sanitize(payload) else {
            return;
        };

        match parse_payload(&payload) {
            Ok(normalized) => {
                for warning in &normalized.warnings {
                    self.warn(&format!("{}: {}", warning, payload));
                }
                self.dispatch(normalized.record);
            }
            Err(err) => {
                self.dropped_lines += 1;
                self.warn(&format!("Failed to parse telemetry ({}): {}", err, payload));
            }
        }
    }

    fn dispatch(&mut self, record: TelemetryRecord) {
        self.log_message(&record);

        let changed = match &record {
            TelemetryRecord::Action(header) => self.accumulator.record(header),
            TelemetryRecord::PlayerBuildInfo(info) => self.accumulator.record_player_build_info(info),
            TelemetryRecord::MemoryLeak(leak) => {
                self.report_leak(leak);
                false
            }
            TelemetryRecord::Generic(_) => false,
        };

        self.records.push(record);
        if changed && !self.deferred {
            self.render();
        }
    }

    fn log_message(&mut self, record: &TelemetryRecord) {
        let header = record.header();
        let Some(route) = self.policy.route(header) else {
            return;
        };
        let Some(message) = header.message_text().map(str::to_string) else {
            return;
        };

        self.prepare_for_content();
        match route {
            Route::Verbatim => {
                if let Err(err) = self.sink.output(&message) {
                    self.write_failed(err);
                }
            }
            Route::Annotated { file, line } => {
                self.sink
                    .annotate(AnnotationLevel::Error, &message, Some(file.as_str()), line);
            }
            Route::Error => self.sink.error(&message),
            Route::Warning => self.sink.warn(&message),
            Route::Info => self.sink.info(&message),
            Route::Debug => self.sink.debug(&message),
        }

        if let Some(trace) = header.stack_trace.as_deref().filter(|t| !t.trim().is_empty()) {
            self.sink.debug(trace.trim_end());
        }
    }

    fn report_leak(&mut self, leak: &MemoryLeakRecord) {
        let Some(bytes) = leak.allocated_memory.filter(|b| *b > 0) else {
            return;
        };

        self.warn(&format!("Memory leak detected: {} bytes still allocated", bytes));
        for label in &leak.memory_labels {
            self.sink.debug(&format!("  {}: {}", label.label, label.value));
        }
    }

    fn render(&mut self) {
        let snapshot = self.accumulator.snapshot();
        self.draw(snapshot);
    }

    fn draw(&mut self, snapshot: Option<ActionTableSnapshot>) {
        if let Err(err) = self.view.render(snapshot.as_ref()) {
            self.write_failed(err);
        }
        self.needs_restore = false;
        self.last_rendered = snapshot;
    }

    /// Redraw the table below whatever output the last batch interleaved
    pub(crate) fn end_batch(&mut self) {
        if !self.needs_restore {
            return;
        }
        self.needs_restore = false;
        if let Err(err) = self.view.restore() {
            self.write_failed(err);
        }
    }

    /// Draw the final table, unless it is already showing, and keep it on screen
    pub(crate) fn finish(&mut self) {
        self.end_batch();
        let snapshot = self.accumulator.snapshot();
        if snapshot != self.last_rendered {
            self.draw(snapshot);
        }
        if let Err(err) = self.view.finish() {
            self.write_failed(err);
        }
        if let Err(err) = self.sink.output("") {
            self.write_failed(err);
        }
    }

    pub(crate) fn warn(&mut self, message: &str) {
        self.prepare_for_content();
        self.sink.warn(message);
    }

    pub(crate) fn records(&self) -> &[TelemetryRecord] {
        &self.records
    }

    pub(crate) fn into_parts(self) -> (Vec<TelemetryRecord>, usize, usize) {
        (self.records, self.plain_lines_forwarded, self.dropped_lines)
    }

    fn emit_output(&mut self, line: &str) {
        self.prepare_for_content();
        if let Err(err) = self.sink.output(line) {
            self.write_failed(err);
        }
    }

    fn prepare_for_content(&mut self) {
        if self.needs_restore {
            return;
        }
        self.needs_restore = true;
        if let Err(err) = self.view.prepare_for_content() {
            self.sink.warn(&format!("Failed to clear timeline: {}", err));
        }
    }

    fn write_failed(&self, err: io::Error) {
        self.sink.warn(&format!("Failed to write output: {}", err));
    }
}
