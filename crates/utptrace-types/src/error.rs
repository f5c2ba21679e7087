use std::fmt;

/// Result type for utptrace-types operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while decoding telemetry
#[derive(Debug)]
pub enum Error {
    /// Payload was not valid JSON
    Json(serde_json::Error),

    /// Payload was valid JSON but not a telemetry object
    InvalidRecord(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Json(err) => write!(f, "JSON error: {}", err),
            Error::InvalidRecord(msg) => write!(f, "Invalid telemetry record: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Json(err) => Some(err),
            Error::InvalidRecord(_) => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}
