pub mod annotations;
pub mod renderers;
pub mod sink;

pub use annotations::format_annotation;
pub use renderers::{AnsiTerminal, LiveRenderer, MockTerminal, TerminalWriter};
pub use sink::ConsoleSink;
