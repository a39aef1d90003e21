//! Table loader
//!
//! Streams one CSV file into one table inside a single transaction: every row
//! is inserted in file order, then the table is committed once. Any failure
//! rolls the table back.

use crate::plan::TableSpec;
use agrovida_csv_rows::{CsvRowsError, ProjectedReader};
use agrovida_mysql_sink::statement::InsertStatement;
use agrovida_mysql_sink::{LoadTarget, SinkError};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// A table-scoped load failure. The table's uncommitted rows have been rolled back.
#[derive(Error, Debug)]
pub enum TableLoadError {
    #[error(transparent)]
    Source(#[from] CsvRowsError),

    #[error(transparent)]
    Target(#[from] SinkError),
}

/// Load `spec.file` from `data_dir` into `spec.table`, `batch_size` rows per statement.
///
/// The batch is capped so one statement never exceeds MySQL's placeholder
/// limit. Returns the number of rows committed.
pub async fn load_table<T: LoadTarget + ?Sized>(
    target: &mut T,
    data_dir: &Path,
    spec: &TableSpec,
    batch_size: usize,
) -> Result<u64, TableLoadError> {
    match insert_and_commit(target, data_dir, spec, batch_size).await {
        Ok(rows) => {
            info!("Committed {rows} rows into {}", spec.table);
            Ok(rows)
        }
        Err(e) => {
            warn!("Rolling back {}: {e}", spec.table);
            if let Err(rollback_err) = target.rollback().await {
                warn!("Rollback of {} failed: {rollback_err}", spec.table);
            }
            Err(e)
        }
    }
}

async fn insert_and_commit<T: LoadTarget + ?Sized>(
    target: &mut T,
    data_dir: &Path,
    spec: &TableSpec,
    batch_size: usize,
) -> Result<u64, TableLoadError> {
    let inserted = insert_rows(target, data_dir, spec, batch_size).await?;
    target.commit().await?;
    Ok(inserted)
}

async fn insert_rows<T: LoadTarget + ?Sized>(
    target: &mut T,
    data_dir: &Path,
    spec: &TableSpec,
    batch_size: usize,
) -> Result<u64, TableLoadError> {
    let path = data_dir.join(&spec.file);
    let reader = ProjectedReader::open(&path, &spec.columns)?;
    let statement = InsertStatement::new(&spec.table, reader.columns());
    let max_rows = statement.max_rows_per_statement();
    if batch_size > max_rows {
        debug!(
            "Capping batch size for {} at {max_rows} rows ({} columns)",
            spec.table,
            statement.columns().len()
        );
    }
    let batch_size = batch_size.clamp(1, max_rows);

    debug!("Loading {} into {}", path.display(), spec.table);

    let mut inserted = 0u64;
    let mut batch: Vec<Vec<Option<String>>> = Vec::with_capacity(batch_size);
    for row in reader.rows() {
        batch.push(row?);
        if batch.len() == batch_size {
            inserted += target.insert_rows(&statement, &batch).await?;
            batch.clear();
        }
    }
    if !batch.is_empty() {
        inserted += target.insert_rows(&statement, &batch).await?;
    }

    Ok(inserted)
}
