use super::{build_tailer, print_summary};
use crate::args::TailArgs;
use crate::config::Settings;
use anyhow::{Context, Result, bail};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn handle(settings: &Settings, args: &TailArgs) -> Result<()> {
    if !args.log_file.is_file() {
        bail!("Log file not found: {}", args.log_file.display());
    }

    let tailer = build_tailer(settings, &args.log_file);
    let stopped = Arc::new(AtomicBool::new(true));
    let handle = tailer
        .spawn_with_stop(stopped)
        .context("Failed to start the log tailer")?;
    let outcome = handle.join()?;

    print_summary(&outcome, &args.log_file, settings);
    Ok(())
}
