//! AgroVida bulk loader
//!
//! Loads the seven normalized AgroVida CSV files into MySQL in dependency
//! order, one transaction per table, with foreign key checks suspended for
//! the duration of the load.
//!
//! # Usage
//!
//! ```bash
//! # Load ./database/data into the local development database
//! agrovida-loader
//!
//! # Explicit connection and 500-row insert statements
//! DB_HOST=db.internal DB_PASSWORD=secret agrovida-loader \
//!   --data-dir /srv/agrovida/data \
//!   --batch-size 500
//! ```
//!
//! # Crates
//!
//! - `agrovida_csv_rows` - header-aware CSV reading and column projection
//! - `agrovida_mysql_sink` - the `LoadTarget` seam and its MySQL session

pub mod config;
pub mod loader;
pub mod orchestrator;
pub mod plan;
pub mod report;
pub mod testing;

pub use config::{DatabaseOpts, LoadOpts, LoaderArgs};
pub use loader::{load_table, TableLoadError};
pub use orchestrator::{with_foreign_key_checks_suspended, LoadOptions, Loader};
pub use plan::{LoadPlan, TableSpec};
pub use report::{LoadReport, TableOutcome};
