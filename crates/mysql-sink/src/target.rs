//! The write seam between the loader and a database session.

use crate::error::SinkError;
use crate::statement::InsertStatement;
use async_trait::async_trait;

/// A single database session the loader writes through.
///
/// Inserts accumulate in an open transaction until [`LoadTarget::commit`] or
/// [`LoadTarget::rollback`] is called.
#[async_trait]
pub trait LoadTarget: Send {
    /// Toggle referential-integrity enforcement for this session.
    async fn set_foreign_key_checks(&mut self, enabled: bool) -> Result<(), SinkError>;

    /// Insert `rows` with one statement. Every row holds one value per column of
    /// `statement`, in column order; `None` is bound as NULL. Returns the
    /// number of rows inserted.
    async fn insert_rows(
        &mut self,
        statement: &InsertStatement,
        rows: &[Vec<Option<String>>],
    ) -> Result<u64, SinkError>;

    async fn commit(&mut self) -> Result<(), SinkError>;

    async fn rollback(&mut self) -> Result<(), SinkError>;

    /// Current number of committed rows visible in `table`.
    async fn count_rows(&mut self, table: &str) -> Result<u64, SinkError>;
}
