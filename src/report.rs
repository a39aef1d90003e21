//! Load outcomes and the verification summary.

use crate::loader::TableLoadError;
use std::fmt;

/// Result of loading one table.
#[derive(Debug)]
pub struct TableOutcome {
    pub table: String,
    pub result: Result<u64, TableLoadError>,
}

impl TableOutcome {
    /// Progress line printed right after the table is attempted.
    pub fn progress_line(&self) -> String {
        match &self.result {
            Ok(rows) => format!(" {}: {rows} records loaded successfully", self.table),
            Err(e) => format!("Error loading {}: {e}", self.table),
        }
    }
}

/// Everything a run produced: per-table outcomes and the verified row counts.
#[derive(Debug)]
pub struct LoadReport {
    pub outcomes: Vec<TableOutcome>,
    pub counts: Vec<(String, u64)>,
}

impl LoadReport {
    pub fn failed_tables(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_err())
            .map(|o| o.table.as_str())
            .collect()
    }

    /// Whether every table loaded.
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// Verified row count of `table`.
    pub fn count(&self, table: &str) -> Option<u64> {
        self.counts
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, count)| *count)
    }

    pub fn summary(&self) -> Summary<'_> {
        Summary(self)
    }
}

/// Verification summary as printed at the end of a run.
pub struct Summary<'a>(&'a LoadReport);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Data Loading Summary:")?;
        writeln!(f, "{}", "-".repeat(30))?;
        for (table, count) in &self.0.counts {
            writeln!(f, "{table}: {count} records")?;
        }
        Ok(())
    }
}
