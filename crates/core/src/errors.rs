use chrono::NaiveDateTime;
use thiserror::Error;

/// Why a raw row was rejected during normalization. Rows failing here are
/// dropped and counted; they never abort a run.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("order `{order_id}` has malformed purchase timestamp `{value}`")]
    MalformedTimestamp { order_id: String, value: String },
    #[error("item of order `{order_id}` has malformed price `{value}`")]
    MalformedPrice { order_id: String, value: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDateTime, end: NaiveDateTime },
    #[error("unknown category `{0}`")]
    UnknownCategory(String),
    #[error("top-n must be in range 1..=50, got {0}")]
    InvalidTopN(usize),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("data load failure: {0}")]
    Load(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}
