pub mod config;
pub mod error;
pub mod routing;
pub mod sink;
pub mod tail;
pub mod view;

pub use config::{
    AnnotationStyle, Config, DisplaySection, TailConfig, TailSection, resolve_config_path,
};
pub use error::{Error, Result};
pub use routing::{SeverityPolicy, has_annotation_marker};
pub use sink::{AnnotationLevel, LogSink, MemorySink, SinkEntry};
pub use tail::{LogTailer, TailCursor, TailHandle, TailOutcome, sidecar_path};
pub use view::{RecordingView, TimelineView, ViewEvent};
