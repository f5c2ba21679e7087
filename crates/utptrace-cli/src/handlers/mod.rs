pub mod replay;
pub mod tail;

use crate::config::{Settings, is_ci};
use crate::presentation::{AnsiTerminal, ConsoleSink, LiveRenderer};
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use std::path::Path;
use utptrace_runtime::{LogTailer, TailOutcome, sidecar_path};

fn build_tailer(settings: &Settings, log_file: &Path) -> LogTailer {
    let redraw = std::io::stdout().is_terminal() && !is_ci(|key| std::env::var(key).ok());
    let view = LiveRenderer::new(AnsiTerminal::new(), redraw, settings.fallback_columns);
    let sink = ConsoleSink::stdout(settings.annotations);

    LogTailer::new(
        log_file,
        settings.tail.clone(),
        Box::new(sink),
        Box::new(view),
    )
}

fn print_summary(outcome: &TailOutcome, log_file: &Path, settings: &Settings) {
    let mut summary = format!(
        "Captured {} telemetry records from {} ({} log lines forwarded",
        outcome.records.len(),
        log_file.display(),
        outcome.plain_lines_forwarded
    );
    if outcome.dropped_lines > 0 {
        summary.push_str(&format!(", {} malformed lines dropped", outcome.dropped_lines));
    }
    summary.push(')');

    let sidecar = settings
        .tail
        .write_sidecar
        .then(|| sidecar_path(log_file))
        .filter(|path| path.exists());

    if std::io::stderr().is_terminal() {
        eprintln!("{} {}", "utptrace:".bold(), summary);
        if let Some(path) = sidecar {
            eprintln!("{} {}", "telemetry:".bold(), path.display().cyan());
        }
    } else {
        eprintln!("utptrace: {}", summary);
        if let Some(path) = sidecar {
            eprintln!("telemetry: {}", path.display());
        }
    }
}
