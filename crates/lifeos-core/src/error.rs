use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid calendar date {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("invalid RFC 3339 timestamp {0:?}")]
    InvalidTimestamp(String),
}
