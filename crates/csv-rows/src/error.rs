//! Error types for CSV projection.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading a source CSV file.
#[derive(Error, Debug)]
pub enum CsvRowsError {
    /// The file could not be opened.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required column is not present in the header row.
    #[error("column '{column}' not found in header of {path}")]
    MissingColumn { path: PathBuf, column: String },

    /// The header row or a record could not be parsed.
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
