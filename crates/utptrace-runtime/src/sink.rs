use std::io;
use std::sync::Mutex;

/// Severity of a source annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationLevel {
    Notice,
    Warning,
    Error,
}

impl AnnotationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AnnotationLevel::Notice => "notice",
            AnnotationLevel::Warning => "warning",
            AnnotationLevel::Error => "error",
        }
    }
}

/// Where the tailer sends everything that is not the timeline table.
///
/// Leveled calls are diagnostics; `output` carries forwarded log lines verbatim.
pub trait LogSink: Send {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
    fn debug(&self, message: &str);
    fn annotate(&self, level: AnnotationLevel, message: &str, file: Option<&str>, line: Option<i64>);
    fn output(&self, line: &str) -> io::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEntry {
    Info(String),
    Warn(String),
    Error(String),
    Debug(String),
    Annotation {
        level: AnnotationLevel,
        message: String,
        file: Option<String>,
        line: Option<i64>,
    },
    Output(String),
}

/// In-memory sink that records every call in order
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<SinkEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<SinkEntry> {
        self.lock().clone()
    }

    pub fn outputs(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|entry| match entry {
                SinkEntry::Output(line) => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|entry| match entry {
                SinkEntry::Warn(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, entry: SinkEntry) {
        self.lock().push(entry);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SinkEntry>> {
        // A poisoned log is still a readable log
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LogSink for MemorySink {
    fn info(&self, message: &str) {
        self.push(SinkEntry::Info(message.to_string()));
    }

    fn warn(&self, message: &str) {
        self.push(SinkEntry::Warn(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.push(SinkEntry::Error(message.to_string()));
    }

    fn debug(&self, message: &str) {
        self.push(SinkEntry::Debug(message.to_string()));
    }

    fn annotate(&self, level: AnnotationLevel, message: &str, file: Option<&str>, line: Option<i64>) {
        self.push(SinkEntry::Annotation {
            level,
            message: message.to_string(),
            file: file.map(str::to_string),
            line,
        });
    }

    fn output(&self, line: &str) -> io::Result<()> {
        self.push(SinkEntry::Output(line.to_string()));
        Ok(())
    }
}

impl<T: LogSink + Sync> LogSink for std::sync::Arc<T> {
    fn info(&self, message: &str) {
        (**self).info(message)
    }

    fn warn(&self, message: &str) {
        (**self).warn(message)
    }

    fn error(&self, message: &str) {
        (**self).error(message)
    }

    fn debug(&self, message: &str) {
        (**self).debug(message)
    }

    fn annotate(&self, level: AnnotationLevel, message: &str, file: Option<&str>, line: Option<i64>) {
        (**self).annotate(level, message, file, line)
    }

    fn output(&self, line: &str) -> io::Result<()> {
        (**self).output(line)
    }
}
