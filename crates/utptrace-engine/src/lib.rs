// Engine module - turns normalized telemetry into a build timeline
// This layer sits between telemetry types and the runtime/presentation layers

pub mod accumulator;
pub mod format;
pub mod snapshot;
pub mod width;

pub use accumulator::{ActionAccumulator, format_error};
pub use format::{FormattedTable, MIN_TABLE_WIDTH, format_duration, format_table};
pub use snapshot::{
    ActionSummary, ActionTableSnapshot, PlayerBuildInfoSnapshot, PlayerBuildStepSummary,
};
pub use width::display_width;
