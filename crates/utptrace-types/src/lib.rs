pub mod error;
pub mod telemetry;

pub use error::{Error, Result};
pub use telemetry::*;
