mod duration;
pub mod table;

pub use duration::format_duration;

use crate::snapshot::{ActionSummary, ActionTableSnapshot, PlayerBuildInfoSnapshot};
use crate::width::wrap_to_width;
use table::{Column, Table};

pub const STATUS_PENDING: &str = "⏳";
pub const STATUS_OK: &str = "✅";
pub const STATUS_FAILED: &str = "❌";
pub const DURATION_PLACEHOLDER: &str = "…";

/// Narrowest width at which every table still renders exactly as wide as
/// requested: the action table with its error column and the description
/// squeezed to [`table::MIN_FLEX_WIDTH`].
pub const MIN_TABLE_WIDTH: usize = 45;

const DETAIL_INDENT: &str = "  ";
const DETAIL_BULLET: &str = "• ";
const DETAIL_CONTINUATION: &str = "    ";

/// Rendered timeline text, without a trailing newline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedTable {
    pub text: String,
    pub line_count: usize,
}

/// Lay out a snapshot as bordered tables exactly `max_width` columns wide.
///
/// Returns `None` when there is nothing to show. The error column only exists
/// while at least one error has been recorded; in that case an "Error Details"
/// section follows the tables, wrapped to `max_width`.
pub fn format_table(snapshot: &ActionTableSnapshot, max_width: usize) -> Option<FormattedTable> {
    let has_rows = !snapshot.pending.is_empty() || !snapshot.completed.is_empty();
    if !has_rows && snapshot.player_build_info.is_none() {
        return None;
    }

    let show_errors = snapshot.total_error_count > 0;
    let mut lines = Vec::new();

    if has_rows {
        lines.extend(action_table(snapshot, show_errors).render(max_width));
    }

    if let Some(build) = &snapshot.player_build_info {
        lines.extend(player_build_table(build).render(max_width));
    }

    let failed: Vec<&ActionSummary> = snapshot
        .completed
        .iter()
        .filter(|action| action.has_errors())
        .collect();
    if show_errors && !failed.is_empty() {
        lines.push(String::new());
        lines.push("Error Details".to_string());
        for action in failed {
            lines.extend(error_details(action, max_width));
        }
    }

    let line_count = lines.len();
    Some(FormattedTable {
        text: lines.join("\n"),
        line_count,
    })
}

fn action_table(snapshot: &ActionTableSnapshot, show_errors: bool) -> Table {
    let mut columns = vec![
        Column::left(""),
        Column::left("Description"),
        Column::right("Duration"),
    ];
    if show_errors {
        columns.push(Column::right("Errors"));
    }

    let mut table = Table::new(columns, 1);

    for action in &snapshot.completed {
        let status = if action.has_errors() {
            STATUS_FAILED
        } else {
            STATUS_OK
        };
        let mut row = vec![
            status.to_string(),
            action.title().to_string(),
            format_duration(action.duration_ms),
        ];
        if show_errors {
            row.push(action.errors.len().to_string());
        }
        table.push_row(row);
    }

    for action in &snapshot.pending {
        let mut row = vec![
            STATUS_PENDING.to_string(),
            action.title().to_string(),
            DURATION_PLACEHOLDER.to_string(),
        ];
        if show_errors {
            row.push(String::new());
        }
        table.push_row(row);
    }

    let mut footer = vec![
        String::new(),
        "Total".to_string(),
        format_duration(snapshot.total_duration_ms),
    ];
    if show_errors {
        footer.push(snapshot.total_error_count.to_string());
    }
    table.set_footer(footer);

    table
}

fn player_build_table(build: &PlayerBuildInfoSnapshot) -> Table {
    let mut table = Table::new(
        vec![
            Column::left("Build Step"),
            Column::right("Duration"),
            Column::right("Errors"),
        ],
        0,
    );

    for step in &build.steps {
        table.push_row(vec![
            step.description.clone(),
            format_duration(step.duration_ms),
            step.error_count.to_string(),
        ]);
    }

    table.set_footer(vec![
        "Total".to_string(),
        format_duration(build.total_duration_ms),
        build.total_error_count.to_string(),
    ]);

    table
}

fn error_details(action: &ActionSummary, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let heading = format!("{} {}", STATUS_FAILED, action.title());
    lines.extend(wrap_to_width(&heading, max_width));

    for error in &action.errors {
        for (index, line) in error.split('\n').enumerate() {
            let prefix = if index == 0 {
                format!("{}{}", DETAIL_INDENT, DETAIL_BULLET)
            } else {
                DETAIL_CONTINUATION.to_string()
            };
            let available = max_width.saturating_sub(prefix.chars().count());
            for (chunk_index, chunk) in wrap_to_width(line, available).into_iter().enumerate() {
                if chunk_index == 0 {
                    lines.push(format!("{}{}", prefix, chunk).trim_end().to_string());
                } else {
                    let continued = format!("{}{}", DETAIL_CONTINUATION, chunk);
                    lines.push(continued.trim_end().to_string());
                }
            }
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::width::{ELLIPSIS, display_width};

    fn completed(description: &str, duration_ms: u64, errors: &[&str]) -> ActionSummary {
        ActionSummary {
            name: "evt".to_string(),
            description: description.to_string(),
            duration_ms,
            errors: errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    fn snapshot(completed: Vec<ActionSummary>, pending: Vec<ActionSummary>) -> ActionTableSnapshot {
        ActionTableSnapshot {
            total_duration_ms: completed.iter().map(|a| a.duration_ms).sum(),
            total_error_count: completed.iter().map(|a| a.errors.len() as u64).sum(),
            completed,
            pending,
            player_build_info: None,
        }
    }

    #[test]
    fn test_empty_snapshot_formats_to_nothing() {
        assert!(format_table(&snapshot(vec![], vec![]), 80).is_none());
    }

    #[test]
    fn test_every_line_matches_requested_width() {
        let snap = snapshot(
            vec![completed("Build player", 722, &[])],
            vec![completed("Compile scripts ⏳ 日本", 0, &[])],
        );
        let table = format_table(&snap, 200).unwrap();

        assert_eq!(table.line_count, table.text.lines().count());
        for line in table.text.lines() {
            assert_eq!(display_width(line), 200, "line: {line}");
        }
    }

    #[test]
    fn test_pending_rows_use_placeholder() {
        let snap = snapshot(vec![], vec![completed("Import", 0, &[])]);
        let table = format_table(&snap, 60).unwrap();
        assert!(table.text.contains(STATUS_PENDING));
        assert!(table.text.contains(DURATION_PLACEHOLDER));
    }

    #[test]
    fn test_error_column_only_with_errors() {
        let clean = format_table(&snapshot(vec![completed("A", 1, &[])], vec![]), 60).unwrap();
        assert!(!clean.text.contains("Errors"));
        assert!(!clean.text.contains("Error Details"));

        let failing =
            format_table(&snapshot(vec![completed("A", 1, &["bad"])], vec![]), 60).unwrap();
        assert!(failing.text.contains("Errors"));
        assert!(failing.text.contains(STATUS_FAILED));
        assert!(failing.text.contains("Error Details"));
    }

    #[test]
    fn test_error_details_indent_continuation_lines() {
        let snap = snapshot(
            vec![completed("Compile", 5, &["CS0103: missing\n  at Foo.cs:12"])],
            vec![],
        );
        let table = format_table(&snap, 60).unwrap();
        let lines: Vec<&str> = table.text.lines().collect();
        let start = lines.iter().position(|l| *l == "Error Details").unwrap();

        assert_eq!(lines[start + 1], "❌ Compile");
        assert_eq!(lines[start + 2], "  • CS0103: missing");
        assert_eq!(lines[start + 3], "      at Foo.cs:12");
    }

    #[test]
    fn test_blank_description_falls_back_to_name() {
        let snap = snapshot(vec![completed("", 5, &["bad"])], vec![]);
        let table = format_table(&snap, 60).unwrap();
        assert!(table.text.contains("❌ evt"));
    }

    #[test]
    fn test_narrow_width_truncates_description() {
        let long = "Building the entire player for the standalone target platform";
        let snap = snapshot(vec![completed(long, 722, &[])], vec![]);
        let table = format_table(&snap, 38).unwrap();

        assert!(table.text.contains(ELLIPSIS));
        assert!(!table.text.contains(long));
        for line in table.text.lines() {
            assert_eq!(display_width(line), 38, "line: {line}");
        }
    }

    #[test]
    fn test_short_description_is_not_truncated() {
        let snap = snapshot(vec![completed("Build player", 722, &[])], vec![]);
        let table = format_table(&snap, 38).unwrap();
        assert!(!table.text.contains(ELLIPSIS));
        assert!(table.text.contains("Build player"));
    }

    #[test]
    fn test_player_build_info_only() {
        let snap = ActionTableSnapshot {
            completed: vec![],
            pending: vec![],
            total_duration_ms: 0,
            total_error_count: 0,
            player_build_info: Some(PlayerBuildInfoSnapshot {
                steps: vec![crate::snapshot::PlayerBuildStepSummary {
                    description: "Write player".to_string(),
                    duration_ms: 1_500,
                    error_count: 0,
                }],
                total_duration_ms: 1_500,
                total_error_count: 0,
            }),
        };

        let table = format_table(&snap, 50).unwrap();
        assert!(table.text.starts_with('┌'));
        assert!(table.text.contains("Build Step"));
        assert!(table.text.contains("1.5s"));
        for line in table.text.lines() {
            assert_eq!(display_width(line), 50);
        }
    }

    #[test]
    fn test_min_table_width_holds_for_widest_layout() {
        let long = "Building the entire player for the standalone target platform";
        let snap = snapshot(
            vec![completed(long, 59_999, &["bad"])],
            vec![completed(long, 0, &[])],
        );

        let table = format_table(&snap, MIN_TABLE_WIDTH).unwrap();
        let border = table.text.lines().next().unwrap();
        assert_eq!(display_width(border), MIN_TABLE_WIDTH);

        let narrower = format_table(&snap, MIN_TABLE_WIDTH - 1).unwrap();
        let border = narrower.text.lines().next().unwrap();
        assert_eq!(display_width(border), MIN_TABLE_WIDTH);
    }
}
