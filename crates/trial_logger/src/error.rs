use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrialLoggerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid pose header: {0}")]
    PoseHeader(String),

    #[error("Row {row}: expected {expected} columns, got {got}")]
    PoseRow {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("Row {row}: invalid {column} value '{value}'")]
    PoseValue {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("Failed to create directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create file {path}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Core(#[from] fitts_core::FittsError),
}

pub type Result<T> = std::result::Result<T, TrialLoggerError>;
