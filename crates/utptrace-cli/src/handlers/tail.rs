use super::{build_tailer, print_summary};
use crate::args::TailArgs;
use crate::config::Settings;
use anyhow::{Context, Result};
use std::sync::atomic::Ordering;

pub fn handle(settings: &Settings, args: &TailArgs) -> Result<()> {
    let tailer = build_tailer(settings, &args.log_file);
    let handle = tailer.spawn().context("Failed to start the log tailer")?;

    let stop = handle.stop_flag();
    ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))
        .context("Failed to install the Ctrl-C handler")?;

    tracing::info!("Tailing {} (Ctrl-C to stop)", args.log_file.display());
    let outcome = handle.join()?;

    print_summary(&outcome, &args.log_file, settings);
    Ok(())
}
