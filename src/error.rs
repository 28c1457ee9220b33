use thiserror::Error;

use crate::types::Period;

/// Structural problems with the uploaded file. Any of these aborts the whole
/// run before aggregation starts.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("expected at least {required} columns after dropping optional ones, found {found}")]
    TooFewColumns { found: usize, required: usize },

    #[error("invalid date in column '{column}' at line {line}: {value:?}")]
    InvalidDate {
        column: &'static str,
        line: usize,
        value: String,
    },

    #[error("file is empty or has no data rows")]
    EmptyFile,
}

/// Why a single month-over-month or year-over-year comparison is unavailable.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DeltaError {
    #[error("insufficient historical data for this comparison (no data for {0})")]
    MissingPeriod(Period),

    #[error("insufficient historical data for this comparison (zero baseline in {0})")]
    DivisionByZero(Period),

    #[error("insufficient historical data for this comparison (no tickets in {year} up to day {day_of_year})")]
    MissingYearToDate { year: i32, day_of_year: u32 },

    #[error("insufficient historical data for this comparison (zero baseline in {year} up to day {day_of_year})")]
    ZeroYearToDate { year: i32, day_of_year: u32 },
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;
