// Best-effort normalization of raw telemetry objects.
//
// The editor's telemetry schema drifts between releases: fields get renamed
// (`stacktrace` -> `stackTrace`, `fileName` -> `file`), numbers arrive as
// strings, and new keys appear without notice. Nothing here rejects a record
// for its contents; problems are surfaced as warnings next to the record.

use super::record::{
    KIND_ACTION, KIND_MEMORY_LEAK, KIND_MEMORY_LEAKS, KIND_PLAYER_BUILD_INFO, MemoryLabel,
    MemoryLeakRecord, Phase, PlayerBuildInfoRecord, PlayerBuildStep, Severity, TelemetryHeader,
    TelemetryRecord,
};
use crate::{Error, Result};
use serde_json::{Map, Value};

/// Every key the normalizer understands; anything else is reported
pub const KNOWN_KEYS: &[&str] = &[
    "type",
    "version",
    "phase",
    "time",
    "processId",
    "severity",
    "message",
    "stackTrace",
    "stacktrace",
    "file",
    "fileName",
    "line",
    "lineNumber",
    "name",
    "description",
    "duration",
    "errors",
    "allocatedMemory",
    "memoryLabels",
    "steps",
];

/// A normalized record plus the non-fatal problems found while building it
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub record: TelemetryRecord,
    pub warnings: Vec<String>,
}

/// Parse a sanitized `##utp:` payload and normalize it
pub fn parse_payload(payload: &str) -> Result<Normalized> {
    let value: Value = serde_json::from_str(payload)?;
    normalize(value)
}

/// Turn a parsed JSON value into a typed record.
///
/// Only non-object values are errors. Missing `type` and unexpected keys are
/// reported through [`Normalized::warnings`] and the record is kept.
pub fn normalize(value: Value) -> Result<Normalized> {
    let mut object = match value {
        Value::Object(object) => object,
        other => {
            return Err(Error::InvalidRecord(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            )));
        }
    };

    let mut warnings = Vec::new();

    let unexpected: Vec<&str> = object
        .keys()
        .map(String::as_str)
        .filter(|key| !KNOWN_KEYS.contains(key))
        .collect();
    if !unexpected.is_empty() {
        warnings.push(format!(
            "Unexpected telemetry keys: {}",
            unexpected.join(", ")
        ));
    }

    let header = take_header(&mut object);
    if header.kind.is_none() {
        warnings.push("Telemetry record is missing its 'type' field".to_string());
    }

    let kind = header.kind.clone();
    let record = match kind.as_deref() {
        Some(KIND_ACTION) => finish_header(header, object, TelemetryRecord::Action),
        Some(KIND_PLAYER_BUILD_INFO) => {
            let steps = take_steps(&mut object);
            let header = with_extra(header, object);
            TelemetryRecord::PlayerBuildInfo(PlayerBuildInfoRecord { header, steps })
        }
        Some(KIND_MEMORY_LEAK) | Some(KIND_MEMORY_LEAKS) => {
            let allocated_memory = object.remove("allocatedMemory").and_then(as_i64);
            let memory_labels = object
                .remove("memoryLabels")
                .map(memory_labels)
                .unwrap_or_default();
            let header = with_extra(header, object);
            TelemetryRecord::MemoryLeak(MemoryLeakRecord {
                header,
                allocated_memory,
                memory_labels,
            })
        }
        _ => finish_header(header, object, TelemetryRecord::Generic),
    };

    Ok(Normalized { record, warnings })
}

fn finish_header(
    header: TelemetryHeader,
    rest: Map<String, Value>,
    wrap: fn(TelemetryHeader) -> TelemetryRecord,
) -> TelemetryRecord {
    wrap(with_extra(header, rest))
}

fn with_extra(mut header: TelemetryHeader, rest: Map<String, Value>) -> TelemetryHeader {
    header.extra = rest;
    header
}

fn take_header(object: &mut Map<String, Value>) -> TelemetryHeader {
    let (stack_trace, legacy_stack_trace) = mirror(
        object.remove("stackTrace").and_then(as_string),
        object.remove("stacktrace").and_then(as_string),
    );
    let (file, file_name) = mirror(
        object.remove("file").and_then(as_string),
        object.remove("fileName").and_then(as_string),
    );
    let (line, line_number) = mirror(
        object.remove("line").and_then(as_i64),
        object.remove("lineNumber").and_then(as_i64),
    );

    TelemetryHeader {
        kind: object.remove("type").and_then(as_string),
        version: object.remove("version").and_then(as_i64),
        phase: object
            .remove("phase")
            .and_then(as_string)
            .and_then(|p| Phase::parse(&p)),
        time: object.remove("time").and_then(as_i64),
        process_id: object.remove("processId").and_then(as_i64),
        severity: object
            .remove("severity")
            .and_then(as_string)
            .and_then(|s| Severity::parse(&s)),
        message: object.remove("message").and_then(as_string),
        stack_trace,
        legacy_stack_trace,
        file,
        file_name,
        line,
        line_number,
        name: object.remove("name").and_then(as_string),
        description: object.remove("description").and_then(as_string),
        duration: object.remove("duration").and_then(as_f64),
        errors: object.remove("errors").map(as_list).unwrap_or_default(),
        extra: Map::new(),
    }
}

/// Fill whichever side of an alias pair is missing from the other
fn mirror<T: Clone>(canonical: Option<T>, legacy: Option<T>) -> (Option<T>, Option<T>) {
    match (canonical, legacy) {
        (Some(value), None) => (Some(value.clone()), Some(value)),
        (None, Some(value)) => (Some(value.clone()), Some(value)),
        pair => pair,
    }
}

fn take_steps(object: &mut Map<String, Value>) -> Vec<PlayerBuildStep> {
    let Some(Value::Array(items)) = object.remove("steps") else {
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(mut step) => Some(PlayerBuildStep {
                description: step.remove("description").and_then(as_string),
                duration: step.remove("duration").and_then(as_f64),
                errors: step.remove("errors").and_then(|errors| match errors {
                    Value::Array(list) => Some(list.len() as i64),
                    other => as_i64(other),
                }),
            }),
            _ => None,
        })
        .collect()
}

/// Accept both `{label: bytes, ...}` and `[{label: bytes}, ...]`
fn memory_labels(value: Value) -> Vec<MemoryLabel> {
    let entries = |map: Map<String, Value>| {
        map.into_iter()
            .map(|(label, value)| MemoryLabel { label, value })
            .collect::<Vec<_>>()
    };

    match value {
        Value::Object(map) => entries(map),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(entries(map)),
                _ => None,
            })
            .flatten()
            .collect(),
        _ => Vec::new(),
    }
}

fn as_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn as_i64(value: Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
        }
        _ => None,
    }
}

fn as_f64(value: Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn as_list(value: Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        single => vec![single],
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
