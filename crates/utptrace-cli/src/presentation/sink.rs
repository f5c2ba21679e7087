use super::annotations::format_annotation;
use super::renderers::absorb_broken_pipe;
use crate::types::AnnotationFormat;
use std::io::{self, Stdout, Write};
use std::sync::Mutex;
use utptrace_runtime::{AnnotationLevel, LogSink};

/// Diagnostics through `tracing`, forwarded log lines and annotations to `out`
pub struct ConsoleSink<W: Write + Send = Stdout> {
    format: AnnotationFormat,
    out: Mutex<W>,
}

impl ConsoleSink<Stdout> {
    pub fn stdout(format: AnnotationFormat) -> Self {
        Self::new(format, io::stdout())
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(format: AnnotationFormat, out: W) -> Self {
        Self {
            format,
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        absorb_broken_pipe(writeln!(out, "{}", line))
    }
}

impl<W: Write + Send> LogSink for ConsoleSink<W> {
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }

    fn debug(&self, message: &str) {
        tracing::debug!("{}", message);
    }

    fn annotate(&self, level: AnnotationLevel, message: &str, file: Option<&str>, line: Option<i64>) {
        let Some(command) = format_annotation(self.format, level, message, file, line) else {
            match level {
                AnnotationLevel::Error => tracing::error!(file, line, "{}", message),
                AnnotationLevel::Warning => tracing::warn!(file, line, "{}", message),
                AnnotationLevel::Notice => tracing::info!(file, line, "{}", message),
            }
            return;
        };

        if let Err(err) = self.write_line(&command) {
            tracing::warn!("Failed to write annotation: {}", err);
            tracing::error!(file, line, "{}", message);
        }
    }

    fn output(&self, line: &str) -> io::Result<()> {
        self.write_line(line)
    }
}
