use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// `type` value of paired begin/end build actions
pub const KIND_ACTION: &str = "Action";

/// `type` value of the player build summary emitted at the end of a build
pub const KIND_PLAYER_BUILD_INFO: &str = "PlayerBuildInfo";

/// `type` values used for leak reports (older editors pluralise it)
pub const KIND_MEMORY_LEAK: &str = "MemoryLeak";
pub const KIND_MEMORY_LEAKS: &str = "MemoryLeaks";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    Begin,
    End,
    Immediate,
}

impl Phase {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "begin" => Some(Phase::Begin),
            "end" => Some(Phase::End),
            "immediate" => Some(Phase::Immediate),
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Begin => write!(f, "Begin"),
            Phase::End => write!(f, "End"),
            Phase::Immediate => write!(f, "Immediate"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Exception,
    Assert,
}

impl Severity {
    /// Accepts the canonical names plus the editor's `Log` alias for `Info`
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "info" | "log" => Some(Severity::Info),
            "warning" | "warn" => Some(Severity::Warning),
            "error" => Some(Severity::Error),
            "exception" => Some(Severity::Exception),
            "assert" => Some(Severity::Assert),
            _ => None,
        }
    }

    /// Error, Exception and Assert all escalate to error annotations
    pub fn is_error(self) -> bool {
        matches!(
            self,
            Severity::Error | Severity::Exception | Severity::Assert
        )
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "Info"),
            Severity::Warning => write!(f, "Warning"),
            Severity::Error => write!(f, "Error"),
            Severity::Exception => write!(f, "Exception"),
            Severity::Assert => write!(f, "Assert"),
        }
    }
}

/// Fields shared by every telemetry kind.
///
/// Both spellings of the aliased fields (`stackTrace`/`stacktrace`,
/// `file`/`fileName`, `line`/`lineNumber`) are kept populated after
/// normalization, so consumers may read either side.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryHeader {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    #[serde(rename = "stacktrace", skip_serializing_if = "Option::is_none")]
    pub legacy_stack_trace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_millis"
    )]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Value>,
    /// Keys outside the known schema, carried through to the sidecar untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TelemetryHeader {
    /// Message text, if present and not blank
    pub fn message_text(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.trim().is_empty())
    }
}

/// One step of a player build summary
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerBuildStep {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_millis"
    )]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerBuildInfoRecord {
    #[serde(flatten)]
    pub header: TelemetryHeader,
    pub steps: Vec<PlayerBuildStep>,
}

/// A labelled allocation bucket of a leak report, serialised as `{label: value}`
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryLabel {
    pub label: String,
    pub value: Value,
}

impl Serialize for MemoryLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.label, &self.value)?;
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryLeakRecord {
    #[serde(flatten)]
    pub header: TelemetryHeader,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocated_memory: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub memory_labels: Vec<MemoryLabel>,
}

/// A normalized telemetry event, keyed by its `type` field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TelemetryRecord {
    Action(TelemetryHeader),
    PlayerBuildInfo(PlayerBuildInfoRecord),
    MemoryLeak(MemoryLeakRecord),
    /// Any other (or missing) `type`
    Generic(TelemetryHeader),
}

impl TelemetryRecord {
    pub fn header(&self) -> &TelemetryHeader {
        match self {
            TelemetryRecord::Action(header) | TelemetryRecord::Generic(header) => header,
            TelemetryRecord::PlayerBuildInfo(record) => &record.header,
            TelemetryRecord::MemoryLeak(record) => &record.header,
        }
    }

    pub fn header_mut(&mut self) -> &mut TelemetryHeader {
        match self {
            TelemetryRecord::Action(header) | TelemetryRecord::Generic(header) => header,
            TelemetryRecord::PlayerBuildInfo(record) => &mut record.header,
            TelemetryRecord::MemoryLeak(record) => &mut record.header,
        }
    }

    pub fn kind(&self) -> Option<&str> {
        self.header().kind.as_deref()
    }
}

/// Whole milliseconds are written as integers so sidecars keep the editor's shape
fn serialize_millis<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(ms) if ms.fract() == 0.0 && ms.abs() < i64::MAX as f64 => {
            serializer.serialize_i64(*ms as i64)
        }
        Some(ms) => serializer.serialize_f64(*ms),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_parse_is_case_insensitive() {
        assert_eq!(Phase::parse("Begin"), Some(Phase::Begin));
        assert_eq!(Phase::parse("end"), Some(Phase::End));
        assert_eq!(Phase::parse(" IMMEDIATE "), Some(Phase::Immediate));
        assert_eq!(Phase::parse("middle"), None);
    }

    #[test]
    fn test_severity_log_alias() {
        assert_eq!(Severity::parse("Log"), Some(Severity::Info));
        assert!(Severity::Assert.is_error());
        assert!(Severity::Exception.is_error());
        assert!(!Severity::Warning.is_error());
    }

    #[test]
    fn test_serialize_flattens_header() {
        let record = TelemetryRecord::Action(TelemetryHeader {
            kind: Some(KIND_ACTION.to_string()),
            phase: Some(Phase::End),
            duration: Some(722.0),
            ..Default::default()
        });

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "Action", "phase": "End", "duration": 722})
        );
    }

    #[test]
    fn test_memory_label_serializes_as_single_entry_map() {
        let label = MemoryLabel {
            label: "Textures".to_string(),
            value: serde_json::json!(2048),
        };
        assert_eq!(
            serde_json::to_string(&label).unwrap(),
            r#"{"Textures":2048}"#
        );
    }
}
