use regex::Regex;
use std::sync::LazyLock;

/// Marker the editor prepends to every structured telemetry line
pub const TELEMETRY_PREFIX: &str = "##utp:";

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[@-Z\\-_]")
        .unwrap()
});

/// Strip encoding noise from a telemetry payload.
///
/// Removes byte-order marks, NUL bytes and ANSI escape sequences, then trims.
/// Returns `None` when nothing is left, in which case the payload must not be
/// parsed (interleaved writers regularly produce such fragments).
pub fn sanitize(raw: &str) -> Option<String> {
    let stripped: String = raw.chars().filter(|c| *c != '\u{feff}' && *c != '\0').collect();
    let cleaned = ANSI_ESCAPE.replace_all(&stripped, "");
    let trimmed = cleaned.trim();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Split a log line into its telemetry payload, if it carries the marker
pub fn telemetry_payload(line: &str) -> Option<&str> {
    line.trim_start_matches('\u{feff}')
        .strip_prefix(TELEMETRY_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_noise() {
        let raw = "\u{feff}\0 \x1b[31m{\"type\":\"Action\"}\x1b[0m \0";
        assert_eq!(sanitize(raw).as_deref(), Some("{\"type\":\"Action\"}"));
    }

    #[test]
    fn test_sanitize_empty_fragment_is_absent() {
        assert_eq!(sanitize(""), None);
        assert_eq!(sanitize("  \0\u{feff}\x1b[0m  "), None);
    }

    #[test]
    fn test_telemetry_payload_requires_prefix_at_line_start() {
        assert_eq!(telemetry_payload("##utp:{}"), Some("{}"));
        assert_eq!(telemetry_payload("\u{feff}##utp:{}"), Some("{}"));
        assert_eq!(telemetry_payload("Build ##utp:{}"), None);
        assert_eq!(telemetry_payload("plain editor output"), None);
    }
}
