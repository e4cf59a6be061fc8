use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;
use time::Date;

use crate::record::{Metric, MonthDay};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

/// A malformed or incomplete input row or header.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum ValidationError {
    #[error("Missing header row")]
    #[diagnostic(code(climatology::missing_header))]
    MissingHeader,
    #[error("Missing required column `{0}`")]
    #[diagnostic(
        code(climatology::missing_column),
        help("check the `[columns]` section of the configuration")
    )]
    MissingColumn(String),
    #[error("Bad date `{value}` on row {row}")]
    #[diagnostic(code(climatology::bad_date), help("dates must be written as YYYY-MM-DD"))]
    BadDate { row: usize, value: String },
    #[error("Date {0} appears more than once")]
    #[diagnostic(code(climatology::duplicate_date))]
    DuplicateDate(Date),
}

#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum QueryError {
    #[error("No observation for {0}")]
    #[diagnostic(
        code(climatology::empty_cohort),
        help("pick a date that is present in the record set")
    )]
    EmptyCohort(Date),
    #[error("{date} is not part of the {month_day} cohort")]
    #[diagnostic(code(climatology::target_not_in_cohort))]
    TargetNotInCohort { date: Date, month_day: MonthDay },
    #[error("{date} has no {metric} value")]
    #[diagnostic(code(climatology::missing_value))]
    MissingValue { date: Date, metric: Metric },
    #[error("Not enough history: {0}")]
    #[diagnostic(
        code(climatology::insufficient_history),
        help("use a longer record set or a different window")
    )]
    InsufficientHistory(String),
    #[error("Window length must be between 1 and 3660000 days")]
    #[diagnostic(code(climatology::invalid_window))]
    InvalidWindow,
    #[error("Invalid year range {from}..={to}")]
    #[diagnostic(code(climatology::invalid_year_range))]
    InvalidYearRange { from: i32, to: i32 },
}

#[derive(Debug, Error, Diagnostic)]
pub enum IngestError {
    #[error("Could not read {path}: {source}")]
    #[diagnostic(code(climatology::io))]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Input is neither UTF-8 nor CP949 (byte {0})")]
    #[diagnostic(
        code(climatology::encoding),
        help("re-save the file as UTF-8 or CP949")
    )]
    Encoding(usize),
    #[error("Failed to parse CSV: {0}")]
    #[diagnostic(code(climatology::csv))]
    CsvParse(#[from] csv::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("Could not read config {path}: {source}")]
    #[diagnostic(code(climatology::config_io))]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Bad config {path}: {source}")]
    #[diagnostic(code(climatology::config_toml))]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}
