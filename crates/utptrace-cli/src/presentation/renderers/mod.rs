pub mod backend;
pub mod live;

pub use backend::{AnsiTerminal, MockTerminal, TerminalWriter, absorb_broken_pipe};
pub use live::{LiveRenderer, resolve_width};
