use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while locating, reading, or analysing survey data.
#[derive(Debug, Error)]
pub enum Error {
    /// A data product could not be found, or a glob matched more than one file.
    #[error("missing data: {0}")]
    MissingData(String),

    /// A dataset root directory was never configured.
    #[error("dataset root not configured: set ${var}")]
    MissingConfig { var: &'static str },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("FITS error in {path}: {message}")]
    Fits { path: PathBuf, message: String },

    #[error("unexpected array shape: expected {expected:?}, found {found:?}")]
    Shape {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// A catalog line could not be parsed. `line` is 1-based.
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
