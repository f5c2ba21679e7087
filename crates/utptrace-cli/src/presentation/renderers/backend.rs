use crossterm::{cursor, queue, terminal};
use std::io::{self, Write};

/// Minimal terminal control used by the live renderer
pub trait TerminalWriter: Send {
    fn write_line(&mut self, line: &str) -> io::Result<()>;
    fn move_cursor_up(&mut self, lines: usize) -> io::Result<()>;
    fn clear_to_end_of_screen(&mut self) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
    /// Current terminal width, if it can be queried
    fn columns(&self) -> Option<usize>;
}

/// Treat a closed pipe as success; the reader has simply gone away
pub fn absorb_broken_pipe(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

/// Screen model for tests: moving up and clearing drops lines from the bottom
pub struct MockTerminal {
    pub lines: Vec<String>,
    pub columns: Option<usize>,
    pub clear_count: usize,
    pub flush_count: usize,
    cursor_row: usize,
}

impl Default for MockTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTerminal {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            columns: None,
            clear_count: 0,
            flush_count: 0,
            cursor_row: 0,
        }
    }

    pub fn with_columns(columns: usize) -> Self {
        Self {
            columns: Some(columns),
            ..Self::new()
        }
    }
}

impl TerminalWriter for MockTerminal {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.lines.truncate(self.cursor_row);
        self.lines.push(line.to_string());
        self.cursor_row = self.lines.len();
        Ok(())
    }

    fn move_cursor_up(&mut self, lines: usize) -> io::Result<()> {
        self.cursor_row = self.cursor_row.saturating_sub(lines);
        Ok(())
    }

    fn clear_to_end_of_screen(&mut self) -> io::Result<()> {
        self.clear_count += 1;
        self.lines.truncate(self.cursor_row);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_count += 1;
        Ok(())
    }

    fn columns(&self) -> Option<usize> {
        self.columns
    }
}

/// Stdout with crossterm escape sequences
pub struct AnsiTerminal;

impl Default for AnsiTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl AnsiTerminal {
    pub fn new() -> Self {
        Self
    }
}

impl TerminalWriter for AnsiTerminal {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        absorb_broken_pipe(writeln!(io::stdout().lock(), "{}", line))
    }

    fn move_cursor_up(&mut self, lines: usize) -> io::Result<()> {
        if lines == 0 {
            return Ok(());
        }
        let lines = u16::try_from(lines).unwrap_or(u16::MAX);
        let mut stdout = io::stdout().lock();
        absorb_broken_pipe(queue!(
            stdout,
            cursor::MoveUp(lines),
            cursor::MoveToColumn(0)
        ))
    }

    fn clear_to_end_of_screen(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        absorb_broken_pipe(queue!(
            stdout,
            terminal::Clear(terminal::ClearType::FromCursorDown)
        ))
    }

    fn flush(&mut self) -> io::Result<()> {
        absorb_broken_pipe(io::stdout().flush())
    }

    fn columns(&self) -> Option<usize> {
        terminal_size::terminal_size().map(|(terminal_size::Width(w), _)| w as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broken_pipe_is_absorbed() {
        let broken = Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        assert!(absorb_broken_pipe(broken).is_ok());

        let denied = Err(io::Error::new(io::ErrorKind::PermissionDenied, "nope"));
        assert!(absorb_broken_pipe(denied).is_err());
    }

    #[test]
    fn test_mock_terminal_overwrites_after_moving_up() {
        let mut term = MockTerminal::new();
        term.write_line("a").unwrap();
        term.write_line("b").unwrap();
        term.move_cursor_up(1).unwrap();
        term.clear_to_end_of_screen().unwrap();
        term.write_line("c").unwrap();
        assert_eq!(term.lines, vec!["a", "c"]);
    }
}
