use serde::Serialize;

/// One row of the build timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionSummary {
    pub name: String,
    pub description: String,
    pub duration_ms: u64,
    pub errors: Vec<String>,
}

impl ActionSummary {
    /// Description, or the action name when the description is blank
    pub fn title(&self) -> &str {
        if self.description.trim().is_empty() {
            &self.name
        } else {
            &self.description
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerBuildStepSummary {
    pub description: String,
    pub duration_ms: u64,
    pub error_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerBuildInfoSnapshot {
    pub steps: Vec<PlayerBuildStepSummary>,
    pub total_duration_ms: u64,
    pub total_error_count: u64,
}

/// Point-in-time view of the accumulator, built fresh for every render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionTableSnapshot {
    /// Completed actions in completion order
    pub completed: Vec<ActionSummary>,
    /// Actions still waiting for their end record
    pub pending: Vec<ActionSummary>,
    pub total_duration_ms: u64,
    pub total_error_count: u64,
    pub player_build_info: Option<PlayerBuildInfoSnapshot>,
}
