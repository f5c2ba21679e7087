//! Severity routing for loggable telemetry records.

use regex::Regex;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use utptrace_types::{Severity, TelemetryHeader};

/// Editor errors known to be harmless, reported at info level instead
pub const DOWNGRADED_MESSAGES: &[&str] = &[
    "Curl error 42: Callback aborted",
    "[Licensing::Module] Error: Access token is unavailable; failed to update",
];

static ANNOTATION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:::(?:error|warning|notice)\b[^:\n]*::|##\[(?:error|warning)\]|##vso\[)")
        .unwrap()
});

/// Whether `message` already carries a CI annotation command
pub fn has_annotation_marker(message: &str) -> bool {
    ANNOTATION_MARKER.is_match(message)
}

/// How a loggable record should leave the tailer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Already annotated upstream; forward the message untouched
    Verbatim,
    /// Error inside the project, annotate with its source location
    Annotated { file: String, line: Option<i64> },
    Error,
    Warning,
    Info,
    Debug,
}

#[derive(Debug, Clone, Default)]
pub struct SeverityPolicy {
    project_root: Option<PathBuf>,
    downgraded: HashSet<String>,
}

impl SeverityPolicy {
    pub fn new(project_root: Option<PathBuf>, extra_downgrades: &[String]) -> Self {
        let downgraded = DOWNGRADED_MESSAGES
            .iter()
            .map(|m| m.to_string())
            .chain(extra_downgrades.iter().cloned())
            .collect();
        Self {
            project_root: project_root.map(|root| lexical_normalize(&root)),
            downgraded,
        }
    }

    /// Severity after applying the downgrade table
    pub fn effective_severity(&self, header: &TelemetryHeader) -> Option<Severity> {
        match (header.severity, header.message_text()) {
            (Some(severity), Some(message))
                if severity.is_error() && self.downgraded.contains(message) =>
            {
                Some(Severity::Info)
            }
            (severity, _) => severity,
        }
    }

    /// Route for a record's message, or `None` when it carries no message
    pub fn route(&self, header: &TelemetryHeader) -> Option<Route> {
        let message = header.message_text()?;
        let severity = self.effective_severity(header);

        let route = match severity {
            Some(s) if s.is_error() => {
                if has_annotation_marker(message) {
                    Route::Verbatim
                } else if let Some(file) = header.file.as_deref().filter(|f| self.is_in_project(f)) {
                    Route::Annotated {
                        file: file.to_string(),
                        line: header.line,
                    }
                } else {
                    Route::Error
                }
            }
            Some(Severity::Warning) => Route::Warning,
            Some(Severity::Info) if severity != header.severity => Route::Info,
            _ => Route::Debug,
        };
        Some(route)
    }

    /// Whether `file` lies under the project root; relative paths are taken as project-relative
    pub fn is_in_project(&self, file: &str) -> bool {
        let Some(root) = &self.project_root else {
            return false;
        };
        if file.trim().is_empty() {
            return false;
        }

        let path = Path::new(file);
        let absolute = if path.is_absolute() {
            lexical_normalize(path)
        } else {
            lexical_normalize(&root.join(path))
        };
        absolute.starts_with(root)
    }
}

/// Resolve `.` and `..` without touching the filesystem
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push(component);
                }
            }
            other => result.push(other),
        }
    }
    result
}
