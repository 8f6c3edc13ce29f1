use thiserror::Error;

/// Crate specific Errors implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventError {
    /// Timestamp string can't be parsed by any of the supported formats.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// Source location is empty or malformed.
    #[error("invalid source location: {0}")]
    InvalidSource(String),
    /// Source file can't be read.
    #[error("unable to read source: {0}")]
    SourceRead(String),
    /// Network error or non-success HTTP status while fetching the source.
    #[error("unable to fetch source: {0}")]
    Fetch(String),
    /// Source document isn't valid JSON or has no events list.
    #[error("invalid source document: {0}")]
    InvalidDocument(String),
    /// Sink file can't be written.
    #[error("unable to write sink: {0}")]
    SinkWrite(String),
    /// Configuration can't be loaded or has invalid values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Unknown display time zone.
    #[error("invalid time zone: {0}")]
    InvalidTimeZone(String),
}

#[cfg(feature = "async")]
impl From<reqwest::Error> for EventError {
    fn from(err: reqwest::Error) -> Self {
        EventError::Fetch(err.to_string())
    }
}
