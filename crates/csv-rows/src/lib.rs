//! CSV reading for the agrovida loader
//!
//! Opens a headered CSV file and yields each record projected onto an ordered
//! list of required columns, independent of the order the file declares them in.

mod error;
mod reader;

pub use error::CsvRowsError;
pub use reader::{ProjectedReader, ProjectedRows, DEFAULT_DELIMITER};
