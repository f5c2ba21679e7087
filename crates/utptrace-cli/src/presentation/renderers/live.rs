use super::backend::{AnsiTerminal, TerminalWriter};
use std::io;
use utptrace_engine::{ActionTableSnapshot, MIN_TABLE_WIDTH, format_table};
use utptrace_runtime::TimelineView;

pub const MIN_WIDTH: usize = MIN_TABLE_WIDTH;
const SAFETY_MARGIN: usize = 1;

/// Table width for a terminal of `columns`, or `fallback` when unknown
pub fn resolve_width(columns: Option<usize>, fallback: usize) -> usize {
    columns
        .filter(|c| *c > 0)
        .unwrap_or(fallback)
        .saturating_sub(SAFETY_MARGIN)
        .max(MIN_WIDTH)
}

/// Draws the timeline table, redrawing it in place on interactive terminals.
///
/// Without redraw every render appends a new block, so plain logs keep their
/// history.
pub struct LiveRenderer<W: TerminalWriter = AnsiTerminal> {
    writer: W,
    redraw: bool,
    fallback_columns: usize,
    /// Lines of the table currently on screen
    drawn_lines: usize,
    last_snapshot: Option<ActionTableSnapshot>,
}

impl<W: TerminalWriter> LiveRenderer<W> {
    pub fn new(writer: W, redraw: bool, fallback_columns: usize) -> Self {
        Self {
            writer,
            redraw,
            fallback_columns,
            drawn_lines: 0,
            last_snapshot: None,
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn redraws_in_place(&self) -> bool {
        self.redraw
    }

    pub fn width(&self) -> usize {
        resolve_width(self.writer.columns(), self.fallback_columns)
    }

    fn erase(&mut self) -> io::Result<()> {
        if !self.redraw || self.drawn_lines == 0 {
            return Ok(());
        }
        self.writer.move_cursor_up(self.drawn_lines)?;
        self.writer.clear_to_end_of_screen()?;
        self.drawn_lines = 0;
        Ok(())
    }

    fn draw(&mut self) -> io::Result<()> {
        let Some(snapshot) = &self.last_snapshot else {
            return Ok(());
        };
        let Some(table) = format_table(snapshot, self.width()) else {
            return Ok(());
        };

        for line in table.text.lines() {
            self.writer.write_line(line)?;
        }
        if self.redraw {
            self.drawn_lines = table.line_count;
        }
        Ok(())
    }
}

impl<W: TerminalWriter> TimelineView for LiveRenderer<W> {
    fn render(&mut self, snapshot: Option<&ActionTableSnapshot>) -> io::Result<()> {
        self.last_snapshot = snapshot.cloned();
        self.erase()?;
        self.draw()?;
        self.writer.flush()
    }

    fn prepare_for_content(&mut self) -> io::Result<()> {
        self.erase()?;
        self.writer.flush()
    }

    fn restore(&mut self) -> io::Result<()> {
        if !self.redraw || self.drawn_lines > 0 {
            return Ok(());
        }
        self.draw()?;
        self.writer.flush()
    }

    fn finish(&mut self) -> io::Result<()> {
        self.drawn_lines = 0;
        self.last_snapshot = None;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::renderers::backend::MockTerminal;
    use utptrace_engine::ActionSummary;

    fn snapshot(completed: &[(&str, u64)], pending: &[&str]) -> ActionTableSnapshot {
        let summary = |description: &str, duration_ms| ActionSummary {
            name: "evt".to_string(),
            description: description.to_string(),
            duration_ms,
            errors: Vec::new(),
        };
        ActionTableSnapshot {
            completed: completed.iter().map(|(d, ms)| summary(d, *ms)).collect(),
            pending: pending.iter().map(|d| summary(d, 0)).collect(),
            total_duration_ms: completed.iter().map(|(_, ms)| ms).sum(),
            total_error_count: 0,
            player_build_info: None,
        }
    }

    #[test]
    fn test_resolve_width() {
        assert_eq!(resolve_width(Some(100), 120), 99);
        assert_eq!(resolve_width(None, 120), 119);
        assert_eq!(resolve_width(Some(20), 120), MIN_WIDTH);
        assert_eq!(resolve_width(Some(0), 80), 79);
    }

    #[test]
    fn test_redraw_replaces_previous_table() {
        let mut renderer = LiveRenderer::new(MockTerminal::with_columns(61), true, 120);
        renderer.render(Some(&snapshot(&[], &["Build player"]))).unwrap();
        let first = renderer.writer().lines.clone();

        renderer
            .render(Some(&snapshot(&[("Build player", 722)], &[])))
            .unwrap();
        let lines = &renderer.writer().lines;

        assert_eq!(lines.len(), first.len());
        assert!(lines.iter().all(|l| !l.contains("⏳")));
        assert!(lines.iter().any(|l| l.contains("722ms")));
        assert!(lines.iter().all(|l| utptrace_engine::display_width(l) == 60));
    }

    #[test]
    fn test_append_mode_keeps_history() {
        let mut renderer = LiveRenderer::new(MockTerminal::with_columns(61), false, 120);
        renderer.render(Some(&snapshot(&[], &["Build player"]))).unwrap();
        let first = renderer.writer().lines.len();
        renderer
            .render(Some(&snapshot(&[("Build player", 722)], &[])))
            .unwrap();

        assert_eq!(renderer.writer().lines.len(), first * 2);
        assert_eq!(renderer.writer().clear_count, 0);
    }

    #[test]
    fn test_prepare_for_content_and_restore() {
        let mut renderer = LiveRenderer::new(MockTerminal::with_columns(61), true, 120);
        renderer.render(Some(&snapshot(&[], &["Import"]))).unwrap();
        let table = renderer.writer().lines.clone();

        renderer.prepare_for_content().unwrap();
        assert!(renderer.writer().lines.is_empty());

        // Output interleaved by the sink would land here
        renderer.restore().unwrap();
        assert_eq!(renderer.writer().lines, table);
    }

    #[test]
    fn test_absent_snapshot_clears() {
        let mut renderer = LiveRenderer::new(MockTerminal::with_columns(61), true, 120);
        renderer.render(Some(&snapshot(&[], &["Import"]))).unwrap();
        renderer.render(None).unwrap();
        assert!(renderer.writer().lines.is_empty());

        renderer.restore().unwrap();
        assert!(renderer.writer().lines.is_empty());
    }

    #[test]
    fn test_finish_leaves_table_on_screen() {
        let mut renderer = LiveRenderer::new(MockTerminal::with_columns(61), true, 120);
        renderer
            .render(Some(&snapshot(&[("Build player", 722)], &[])))
            .unwrap();
        let table = renderer.writer().lines.clone();

        renderer.finish().unwrap();
        renderer.prepare_for_content().unwrap();
        assert_eq!(renderer.writer().lines, table);
    }

    #[test]
    fn test_narrow_terminal_never_exceeds_min_width() {
        let mut renderer = LiveRenderer::new(MockTerminal::with_columns(20), true, 120);
        let mut snap = snapshot(
            &[("Building the entire player for the standalone target", 59_999)],
            &["Importing every asset in the project"],
        );
        snap.completed[0].errors.push("CS0103: missing symbol".to_string());
        snap.total_error_count = 1;

        renderer.render(Some(&snap)).unwrap();
        let lines = &renderer.writer().lines;
        assert_eq!(utptrace_engine::display_width(&lines[0]), MIN_WIDTH);
        assert!(
            lines
                .iter()
                .all(|l| utptrace_engine::display_width(l) <= MIN_WIDTH)
        );
    }

    #[test]
    fn test_falls_back_when_terminal_width_unknown() {
        let renderer = LiveRenderer::new(MockTerminal::new(), false, 81);
        assert_eq!(renderer.width(), 80);
    }
}
