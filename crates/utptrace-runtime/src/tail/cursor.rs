use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Read position within a growing log file.
///
/// Only the byte range that appeared since the previous poll is read, and the
/// file is opened and closed on every poll. Bytes after the last newline are
/// held back until the rest of their line arrives.
#[derive(Debug, Default, Clone)]
pub struct TailCursor {
    offset: u64,
    partial: Vec<u8>,
}

impl TailCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn has_partial_line(&self) -> bool {
        !self.partial.is_empty()
    }

    /// Read whatever was appended since the last poll and return the complete lines.
    ///
    /// A missing file yields no lines. A file smaller than the cursor was
    /// truncated or rotated; reading restarts from the beginning.
    pub fn poll(&mut self, path: &Path) -> io::Result<Vec<String>> {
        let size = match std::fs::metadata(path) {
            Ok(metadata) => metadata.len(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };

        if size < self.offset {
            self.offset = 0;
            self.partial.clear();
        }
        if size == self.offset {
            return Ok(Vec::new());
        }

        let chunk = read_range(path, self.offset, size)?;
        self.offset += chunk.len() as u64;
        Ok(self.split(&chunk))
    }

    /// Hand back the held partial line, if any, as a complete line
    pub fn take_partial_line(&mut self) -> Option<String> {
        if self.partial.is_empty() {
            return None;
        }
        let bytes = std::mem::take(&mut self.partial);
        Some(decode_line(&bytes))
    }

    fn split(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut buffer = std::mem::take(&mut self.partial);
        buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        for (index, byte) in buffer.iter().enumerate() {
            if *byte == b'\n' {
                lines.push(decode_line(&buffer[start..index]));
                start = index + 1;
            }
        }

        self.partial = buffer.split_off(start);
        lines
    }
}

/// Bytes in `[start, end)`; fewer if the file shrank in between
fn read_range(path: &Path, start: u64, end: u64) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(start))?;

    let mut chunk = Vec::with_capacity((end - start) as usize);
    file.take(end - start).read_to_end(&mut chunk)?;
    Ok(chunk)
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn append(file: &mut NamedTempFile, text: &str) {
        file.write_all(text.as_bytes()).unwrap();
        file.flush().unwrap();
    }

    #[test]
    fn test_missing_file_is_skipped() {
        let mut cursor = TailCursor::new();
        let lines = cursor.poll(Path::new("/nonexistent/utptrace/Editor.log")).unwrap();
        assert!(lines.is_empty());
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn test_reads_only_new_bytes() {
        let mut file = NamedTempFile::new().unwrap();
        let mut cursor = TailCursor::new();

        append(&mut file, "one\ntwo\n");
        assert_eq!(cursor.poll(file.path()).unwrap(), vec!["one", "two"]);
        assert!(cursor.poll(file.path()).unwrap().is_empty());

        append(&mut file, "three\r\n");
        assert_eq!(cursor.poll(file.path()).unwrap(), vec!["three"]);
        assert_eq!(cursor.offset(), 15);
    }

    #[test]
    fn test_partial_line_waits_for_remainder() {
        let mut file = NamedTempFile::new().unwrap();
        let mut cursor = TailCursor::new();

        append(&mut file, "done\nhalf");
        assert_eq!(cursor.poll(file.path()).unwrap(), vec!["done"]);
        assert!(cursor.has_partial_line());

        append(&mut file, " line\n");
        assert_eq!(cursor.poll(file.path()).unwrap(), vec!["half line"]);
        assert!(!cursor.has_partial_line());
    }

    #[test]
    fn test_split_multibyte_character_survives() {
        let mut file = NamedTempFile::new().unwrap();
        let mut cursor = TailCursor::new();
        let bytes = "日本\n".as_bytes();

        file.write_all(&bytes[..4]).unwrap();
        file.flush().unwrap();
        assert!(cursor.poll(file.path()).unwrap().is_empty());

        file.write_all(&bytes[4..]).unwrap();
        file.flush().unwrap();
        assert_eq!(cursor.poll(file.path()).unwrap(), vec!["日本"]);
    }

    #[test]
    fn test_truncation_restarts_from_zero() {
        let mut file = NamedTempFile::new().unwrap();
        let mut cursor = TailCursor::new();

        append(&mut file, "a long first session line\n");
        cursor.poll(file.path()).unwrap();

        std::fs::write(file.path(), "fresh\n").unwrap();
        assert_eq!(cursor.poll(file.path()).unwrap(), vec!["fresh"]);
        assert_eq!(cursor.offset(), 6);
    }

    #[test]
    fn test_take_partial_line() {
        let mut file = NamedTempFile::new().unwrap();
        let mut cursor = TailCursor::new();

        append(&mut file, "no newline");
        assert!(cursor.poll(file.path()).unwrap().is_empty());
        assert_eq!(cursor.take_partial_line().as_deref(), Some("no newline"));
        assert_eq!(cursor.take_partial_line(), None);
    }

    #[test]
    fn test_blank_lines_are_kept() {
        let mut file = NamedTempFile::new().unwrap();
        let mut cursor = TailCursor::new();

        append(&mut file, "a\n\nb\n");
        assert_eq!(cursor.poll(file.path()).unwrap(), vec!["a", "", "b"]);
    }
}
