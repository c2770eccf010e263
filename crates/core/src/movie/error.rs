use thiserror::Error;

/// Errors that can occur when constructing a year range.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum YearRangeError {
    #[error("Invalid year range: start year {start} is after end year {end}")]
    InvalidRange { start: i32, end: i32 },
}
