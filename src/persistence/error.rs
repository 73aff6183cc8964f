use std::io;
use std::sync::Arc;

/// Errors surfaced by the top-score store
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScoreError {
    /// Scores only ever go up
    #[error("cannot lower the top score from {current} to {attempted}")]
    InvariantViolation { current: u32, attempted: u32 },

    /// The background flush could not write the record
    #[error("failed to persist the top score: {0}")]
    Flush(#[source] Arc<io::Error>),
}

/// Errors from decoding a persisted score record
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("TOP_SCORE value is not a non-negative integer: {value:?}")]
    InvalidValue { value: String },
}
