mod normalize;
mod record;
mod sanitize;

pub use normalize::{KNOWN_KEYS, Normalized, normalize, parse_payload};
pub use record::*;
pub use sanitize::{TELEMETRY_PREFIX, sanitize, telemetry_payload};
