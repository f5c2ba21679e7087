use crate::types::{AnnotationFormat, LogLevel};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "utptrace")]
#[command(about = "Live build timelines from Unity Editor telemetry logs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (default: UTPTRACE_CONFIG, then the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[arg(long, default_value = "info", global = true)]
    pub log_level: LogLevel,

    /// Override the annotation syntax picked from the CI environment
    #[arg(long, global = true)]
    pub annotations: Option<AnnotationFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Follow a log file as it is written, until interrupted
    Tail(TailArgs),

    /// Process a finished log file in one pass
    Replay(TailArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TailArgs {
    /// Log file written by the editor
    pub log_file: PathBuf,

    /// Errors from files under this directory are reported as source annotations
    #[arg(long)]
    pub project_root: Option<PathBuf>,

    /// Only show telemetry, not the rest of the log
    #[arg(long)]
    pub telemetry_only: bool,

    /// Write every telemetry record to <log>-utp-json.log when done
    #[arg(long)]
    pub sidecar: bool,
}
