use crate::snapshot::{
    ActionSummary, ActionTableSnapshot, PlayerBuildInfoSnapshot, PlayerBuildStepSummary,
};
use indexmap::IndexMap;
use serde_json::Value;
use utptrace_types::{Phase, PlayerBuildInfoRecord, TelemetryHeader};

/// Pairs `Begin`/`End` action records into a timed build timeline.
///
/// Pending actions are keyed by `processId|name|description`. The editor is
/// not strict about repeating the exact description on the `End` record, so
/// an unmatched end falls back to the first pending action of the same
/// process and name whose description is a prefix of (or prefixed by) the
/// ending description, in insertion order.
#[derive(Debug, Default)]
pub struct ActionAccumulator {
    pending: IndexMap<String, TelemetryHeader>,
    completed: Vec<ActionSummary>,
    total_duration_ms: u64,
    total_error_count: u64,
    player_build_steps: Vec<PlayerBuildStepSummary>,
}

impl ActionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one action record in. Returns whether the timeline changed.
    pub fn record(&mut self, action: &TelemetryHeader) -> bool {
        match action.phase {
            Some(Phase::Begin) => {
                self.pending.insert(identity_key(action), action.clone());
                true
            }
            Some(Phase::End) => {
                let start = self.take_pending(action);
                let summary = complete(start.as_ref(), action);

                self.total_duration_ms += summary.duration_ms;
                self.total_error_count += summary.errors.len() as u64;
                self.completed.push(summary);
                true
            }
            _ => false,
        }
    }

    /// Replace the player build steps. Returns whether any steps remain.
    pub fn record_player_build_info(&mut self, info: &PlayerBuildInfoRecord) -> bool {
        self.player_build_steps = info
            .steps
            .iter()
            .filter_map(|step| {
                let description = step.description.as_deref()?.trim();
                if description.is_empty() {
                    return None;
                }
                Some(PlayerBuildStepSummary {
                    description: description.to_string(),
                    duration_ms: clamp_millis(step.duration),
                    error_count: step.errors.unwrap_or(0).max(0) as u64,
                })
            })
            .collect();

        !self.player_build_steps.is_empty()
    }

    /// `None` until at least one action or build step has been seen
    pub fn snapshot(&self) -> Option<ActionTableSnapshot> {
        if self.pending.is_empty()
            && self.completed.is_empty()
            && self.player_build_steps.is_empty()
        {
            return None;
        }

        let pending = self
            .pending
            .values()
            .map(|action| ActionSummary {
                name: action.name.clone().unwrap_or_default(),
                description: action.description.clone().unwrap_or_default(),
                duration_ms: 0,
                errors: Vec::new(),
            })
            .collect();

        let player_build_info = if self.player_build_steps.is_empty() {
            None
        } else {
            Some(PlayerBuildInfoSnapshot {
                steps: self.player_build_steps.clone(),
                total_duration_ms: self.player_build_steps.iter().map(|s| s.duration_ms).sum(),
                total_error_count: self.player_build_steps.iter().map(|s| s.error_count).sum(),
            })
        };

        Some(ActionTableSnapshot {
            completed: self.completed.clone(),
            pending,
            total_duration_ms: self.total_duration_ms,
            total_error_count: self.total_error_count,
            player_build_info,
        })
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn take_pending(&mut self, end: &TelemetryHeader) -> Option<TelemetryHeader> {
        if let Some(start) = self.pending.shift_remove(&identity_key(end)) {
            return Some(start);
        }

        let end_description = end.description.as_deref().unwrap_or_default();
        let index = self.pending.values().position(|start| {
            let start_description = start.description.as_deref().unwrap_or_default();
            start.process_id == end.process_id
                && start.name == end.name
                && (end_description.starts_with(start_description)
                    || start_description.starts_with(end_description))
        })?;

        self.pending
            .shift_remove_index(index)
            .map(|(_, start)| start)
    }
}

fn identity_key(action: &TelemetryHeader) -> String {
    format!(
        "{}|{}|{}",
        action.process_id.map(|pid| pid.to_string()).unwrap_or_default(),
        action.name.as_deref().unwrap_or_default(),
        action.description.as_deref().unwrap_or_default()
    )
}

fn complete(start: Option<&TelemetryHeader>, end: &TelemetryHeader) -> ActionSummary {
    let duration_ms = match (start.and_then(|s| s.time), end.time) {
        (Some(started), Some(ended)) => ended.saturating_sub(started).max(0) as u64,
        _ => clamp_millis(end.duration),
    };

    let pick = |field: fn(&TelemetryHeader) -> Option<&String>| {
        field(end)
            .filter(|value| !value.trim().is_empty())
            .or_else(|| start.and_then(field))
            .cloned()
            .unwrap_or_default()
    };

    ActionSummary {
        name: pick(|h| h.name.as_ref()),
        description: pick(|h| h.description.as_ref()),
        duration_ms,
        errors: end.errors.iter().map(format_error).collect(),
    }
}

fn clamp_millis(value: Option<f64>) -> u64 {
    value
        .filter(|ms| ms.is_finite() && *ms > 0.0)
        .map(|ms| ms.round() as u64)
        .unwrap_or(0)
}

/// Render one raw error entry as display text.
///
/// Error-like objects (carrying a string `message`) show their stack trace
/// when one is present, otherwise the message; strings pass through; anything
/// else is JSON-encoded. Line endings are normalized and trailing whitespace
/// trimmed.
pub fn format_error(error: &Value) -> String {
    let text = match error {
        Value::String(text) => text.clone(),
        Value::Object(map) if map.get("message").is_some_and(Value::is_string) => {
            ["stack", "stackTrace", "stacktrace"]
                .iter()
                .filter_map(|key| map.get(*key).and_then(Value::as_str))
                .find(|trace| !trace.trim().is_empty())
                .or_else(|| map.get("message").and_then(Value::as_str))
                .unwrap_or_default()
                .to_string()
        }
        other => other.to_string(),
    };

    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use utptrace_types::PlayerBuildStep;

    fn action(phase: Phase, pid: i64, name: &str, description: &str) -> TelemetryHeader {
        TelemetryHeader {
            kind: Some("Action".to_string()),
            phase: Some(phase),
            process_id: Some(pid),
            name: Some(name.to_string()),
            description: Some(description.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_begin_end_pairing() {
        let mut acc = ActionAccumulator::new();
        let mut begin = action(Phase::Begin, 1, "A", "X");
        begin.time = Some(1000);
        let mut end = action(Phase::End, 1, "A", "X");
        end.time = Some(1722);
        end.duration = Some(722.0);

        assert!(acc.record(&begin));
        assert!(acc.record(&end));

        let snapshot = acc.snapshot().unwrap();
        assert!(snapshot.pending.is_empty());
        assert_eq!(snapshot.completed.len(), 1);
        assert_eq!(snapshot.completed[0].duration_ms, 722);
        assert!(snapshot.completed[0].errors.is_empty());
        assert_eq!(snapshot.total_duration_ms, 722);
    }

    #[test]
    fn test_prefix_fallback_consumes_pending() {
        let mut acc = ActionAccumulator::new();
        acc.record(&action(Phase::Begin, 1, "A", "Foo"));
        acc.record(&action(Phase::End, 1, "A", "Foo - bar"));

        let snapshot = acc.snapshot().unwrap();
        assert!(snapshot.pending.is_empty());
        assert_eq!(snapshot.completed[0].description, "Foo - bar");
    }

    #[test]
    fn test_fallback_requires_same_process_and_name() {
        let mut acc = ActionAccumulator::new();
        acc.record(&action(Phase::Begin, 1, "A", "Foo"));
        acc.record(&action(Phase::End, 2, "A", "Foo - bar"));
        acc.record(&action(Phase::End, 1, "B", "Foo - bar"));

        assert_eq!(acc.pending_count(), 1);
        assert_eq!(acc.snapshot().unwrap().completed.len(), 2);
    }

    #[test]
    fn test_fallback_takes_first_pending_match() {
        let mut acc = ActionAccumulator::new();
        acc.record(&action(Phase::Begin, 1, "A", "Import"));
        acc.record(&action(Phase::Begin, 1, "A", "Import assets"));
        acc.record(&action(Phase::End, 1, "A", "Import assets (2)"));

        let snapshot = acc.snapshot().unwrap();
        assert_eq!(snapshot.pending.len(), 1);
        assert_eq!(snapshot.pending[0].description, "Import assets");
    }

    #[test]
    fn test_end_without_timestamps_uses_duration_field() {
        let mut acc = ActionAccumulator::new();
        let mut end = action(Phase::End, 1, "A", "Orphan");
        end.duration = Some(41.6);
        acc.record(&end);

        assert_eq!(acc.snapshot().unwrap().completed[0].duration_ms, 42);
    }

    #[test]
    fn test_negative_elapsed_time_is_clamped() {
        let mut acc = ActionAccumulator::new();
        let mut begin = action(Phase::Begin, 1, "A", "X");
        begin.time = Some(500);
        let mut end = action(Phase::End, 1, "A", "X");
        end.time = Some(100);
        acc.record(&begin);
        acc.record(&end);

        assert_eq!(acc.snapshot().unwrap().completed[0].duration_ms, 0);
    }

    #[test]
    fn test_begin_overwrites_same_key() {
        let mut acc = ActionAccumulator::new();
        acc.record(&action(Phase::Begin, 1, "A", "X"));
        acc.record(&action(Phase::Begin, 1, "A", "X"));
        assert_eq!(acc.pending_count(), 1);
    }

    #[test]
    fn test_other_phases_are_ignored() {
        let mut acc = ActionAccumulator::new();
        assert!(!acc.record(&action(Phase::Immediate, 1, "A", "X")));
        let mut no_phase = action(Phase::Begin, 1, "A", "X");
        no_phase.phase = None;
        assert!(!acc.record(&no_phase));
        assert!(acc.snapshot().is_none());
    }

    #[test]
    fn test_errors_are_counted() {
        let mut acc = ActionAccumulator::new();
        let mut end = action(Phase::End, 1, "A", "Compile");
        end.errors = vec![json!("CS0103: name missing"), json!({"code": 1})];
        acc.record(&end);

        let snapshot = acc.snapshot().unwrap();
        assert_eq!(snapshot.total_error_count, 2);
        assert_eq!(snapshot.completed[0].errors[1], r#"{"code":1}"#);
    }

    #[test]
    fn test_format_error_variants() {
        assert_eq!(format_error(&json!("line one\r\nline two  \n")), "line one\nline two");
        assert_eq!(
            format_error(&json!({"message": "boom", "stack": "Error: boom\n  at x"})),
            "Error: boom\n  at x"
        );
        assert_eq!(format_error(&json!({"message": "boom", "stack": ""})), "boom");
        assert_eq!(format_error(&json!(42)), "42");
    }

    #[test]
    fn test_player_build_info_filters_and_clamps() {
        let mut acc = ActionAccumulator::new();
        let info = PlayerBuildInfoRecord {
            steps: vec![
                PlayerBuildStep {
                    description: Some("Compile".to_string()),
                    duration: Some(-5.0),
                    errors: Some(-1),
                },
                PlayerBuildStep {
                    description: Some("   ".to_string()),
                    duration: Some(10.0),
                    errors: Some(0),
                },
                PlayerBuildStep {
                    description: Some("Pack".to_string()),
                    duration: Some(300.0),
                    errors: Some(2),
                },
            ],
            ..Default::default()
        };

        assert!(acc.record_player_build_info(&info));
        let build = acc.snapshot().unwrap().player_build_info.unwrap();
        assert_eq!(build.steps.len(), 2);
        assert_eq!(build.steps[0].duration_ms, 0);
        assert_eq!(build.steps[0].error_count, 0);
        assert_eq!(build.total_duration_ms, 300);
        assert_eq!(build.total_error_count, 2);
    }

    #[test]
    fn test_empty_player_build_info_reports_unchanged() {
        let mut acc = ActionAccumulator::new();
        assert!(!acc.record_player_build_info(&PlayerBuildInfoRecord::default()));
        assert!(acc.snapshot().is_none());
    }
}
