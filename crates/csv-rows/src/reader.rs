//! Projected CSV reader
//!
//! Resolves the required columns against the header row once, then yields each
//! record as the values of those columns in the requested order. Records may
//! be ragged: a field the record does not reach is `None`, extra trailing
//! fields are ignored.

use crate::error::CsvRowsError;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Field delimiter used by the agrovida data files.
pub const DEFAULT_DELIMITER: u8 = b',';

/// A CSV file whose header has been matched against a column list.
pub struct ProjectedReader {
    path: PathBuf,
    columns: Vec<String>,
    indices: Vec<usize>,
    reader: csv::Reader<File>,
}

impl ProjectedReader {
    /// Open `path` and resolve every name in `columns` against its header row.
    ///
    /// Fails with [`CsvRowsError::MissingColumn`] for the first required column
    /// the header does not contain, before any record is read. A header name
    /// that appears more than once resolves to its last occurrence.
    pub fn open<S: AsRef<str>>(path: &Path, columns: &[S]) -> Result<Self, CsvRowsError> {
        Self::open_with_delimiter(path, columns, DEFAULT_DELIMITER)
    }

    pub fn open_with_delimiter<S: AsRef<str>>(
        path: &Path,
        columns: &[S],
        delimiter: u8,
    ) -> Result<Self, CsvRowsError> {
        let file = File::open(path).map_err(|source| CsvRowsError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(file);

        let headers = reader
            .headers()
            .map_err(|source| CsvRowsError::Csv {
                path: path.to_path_buf(),
                source,
            })?
            .clone();

        let mut indices = Vec::with_capacity(columns.len());
        for column in columns {
            let column = column.as_ref();
            let index = headers
                .iter()
                .enumerate()
                .filter(|(_, h)| *h == column)
                .map(|(i, _)| i)
                .last()
                .ok_or_else(|| CsvRowsError::MissingColumn {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                })?;
            indices.push(index);
        }

        debug!(
            "Resolved columns of {}: {:?} -> {:?}",
            path.display(),
            columns.iter().map(|c| c.as_ref()).collect::<Vec<&str>>(),
            indices
        );

        Ok(Self {
            path: path.to_path_buf(),
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            indices,
            reader,
        })
    }

    /// Required column names, in projection order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Consume the reader, yielding projected records in file order.
    pub fn rows(self) -> ProjectedRows {
        ProjectedRows {
            path: self.path,
            indices: self.indices,
            records: self.reader.into_records(),
        }
    }
}

/// Iterator over projected records. The underlying file is closed when this is dropped.
pub struct ProjectedRows {
    path: PathBuf,
    indices: Vec<usize>,
    records: csv::StringRecordsIntoIter<File>,
}

impl Iterator for ProjectedRows {
    type Item = Result<Vec<Option<String>>, CsvRowsError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(source) => {
                return Some(Err(CsvRowsError::Csv {
                    path: self.path.clone(),
                    source,
                }))
            }
        };

        let values = self
            .indices
            .iter()
            .map(|&i| record.get(i).map(str::to_string))
            .collect();
        Some(Ok(values))
    }
}
