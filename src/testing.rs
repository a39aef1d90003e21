//! Test support
//!
//! [`InMemoryTarget`] stands in for a MySQL session: it keeps pending and
//! committed rows per table, enforces primary keys always and foreign keys
//! only while checks are enabled, rejects statements over MySQL's placeholder
//! limit, and logs every statement it receives. NULL values are left out of
//! the stored row.
//! [`write_agrovida_fixture`] writes a small consistent data set to disk.

use agrovida_mysql_sink::statement::{self, InsertStatement, MAX_PLACEHOLDERS};
use agrovida_mysql_sink::{LoadTarget, SinkError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;

pub type Row = BTreeMap<String, String>;

#[derive(Clone, Debug)]
pub struct ForeignKey {
    pub column: String,
    pub references_table: String,
    pub references_column: String,
}

/// Constraints of one in-memory table.
#[derive(Clone, Debug, Default)]
pub struct TableDef {
    pub primary_key: Option<String>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableDef {
    pub fn with_primary_key(column: &str) -> Self {
        Self {
            primary_key: Some(column.to_string()),
            foreign_keys: Vec::new(),
        }
    }

    pub fn references(mut self, column: &str, table: &str, referenced_column: &str) -> Self {
        self.foreign_keys.push(ForeignKey {
            column: column.to_string(),
            references_table: table.to_string(),
            references_column: referenced_column.to_string(),
        });
        self
    }
}

pub struct InMemoryTarget {
    schemas: BTreeMap<String, TableDef>,
    committed: BTreeMap<String, Vec<Row>>,
    pending: Vec<(String, Row)>,
    foreign_key_checks: bool,
    statements: Vec<String>,
    commits: usize,
    rollbacks: usize,
}

impl Default for InMemoryTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTarget {
    /// An empty target with foreign key checks enabled, as a fresh MySQL session has.
    pub fn new() -> Self {
        Self {
            schemas: BTreeMap::new(),
            committed: BTreeMap::new(),
            pending: Vec::new(),
            foreign_key_checks: true,
            statements: Vec::new(),
            commits: 0,
            rollbacks: 0,
        }
    }

    pub fn with_table(mut self, name: &str, def: TableDef) -> Self {
        self.schemas.insert(name.to_string(), def);
        self.committed.entry(name.to_string()).or_default();
        self
    }

    /// The seven AgroVida tables with their keys.
    pub fn agrovida() -> Self {
        Self::new()
            .with_table("farms", TableDef::with_primary_key("farm_id"))
            .with_table("technicians", TableDef::with_primary_key("technician_id"))
            .with_table("crop_types", TableDef::with_primary_key("crop_type_id"))
            .with_table(
                "varieties",
                TableDef::with_primary_key("variety_id").references(
                    "crop_type_id",
                    "crop_types",
                    "crop_type_id",
                ),
            )
            .with_table("sensors", TableDef::with_primary_key("sensor_id"))
            .with_table(
                "farm_crops",
                TableDef::with_primary_key("farm_crop_id")
                    .references("farm_id", "farms", "farm_id")
                    .references("crop_type_id", "crop_types", "crop_type_id")
                    .references("variety_id", "varieties", "variety_id")
                    .references("technician_id", "technicians", "technician_id"),
            )
            .with_table(
                "sensor_readings",
                TableDef::with_primary_key("reading_id")
                    .references("sensor_id", "sensors", "sensor_id")
                    .references("farm_crop_id", "farm_crops", "farm_crop_id"),
            )
    }

    pub fn foreign_key_checks(&self) -> bool {
        self.foreign_key_checks
    }

    /// Every statement received, in order.
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Statements received that start with `prefix`.
    pub fn statements_starting_with(&self, prefix: &str) -> Vec<&str> {
        self.statements
            .iter()
            .filter(|s| s.starts_with(prefix))
            .map(String::as_str)
            .collect()
    }

    pub fn commits(&self) -> usize {
        self.commits
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks
    }

    /// Committed rows of `table`.
    pub fn rows(&self, table: &str) -> &[Row] {
        self.committed.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn pending_rows(&self) -> usize {
        self.pending.len()
    }

    fn visible_rows<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a Row> + 'a {
        self.rows(table).iter().chain(
            self.pending
                .iter()
                .filter(move |(t, _)| t == table)
                .map(|(_, row)| row),
        )
    }

    fn check_row(&self, table: &str, def: &TableDef, row: &Row, staged: &[Row]) -> Result<(), SinkError> {
        if let Some(pk) = &def.primary_key {
            let key = row.get(pk);
            let duplicate = self
                .visible_rows(table)
                .chain(staged.iter())
                .any(|existing| existing.get(pk) == key);
            if duplicate {
                return Err(SinkError::Rejected(format!(
                    "Duplicate entry '{}' for key '{table}.PRIMARY'",
                    key.map(String::as_str).unwrap_or_default()
                )));
            }
        }

        if !self.foreign_key_checks {
            return Ok(());
        }

        for fk in &def.foreign_keys {
            let Some(value) = row.get(&fk.column).filter(|v| !v.is_empty()) else {
                continue;
            };
            let found = self
                .visible_rows(&fk.references_table)
                .chain(staged.iter().filter(|_| fk.references_table == table))
                .any(|parent| parent.get(&fk.references_column) == Some(value));
            if !found {
                return Err(SinkError::Rejected(format!(
                    "Cannot add or update a child row: a foreign key constraint fails \
                     (`{table}`, FOREIGN KEY (`{}`) REFERENCES `{}` (`{}`))",
                    fk.column, fk.references_table, fk.references_column
                )));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl LoadTarget for InMemoryTarget {
    async fn set_foreign_key_checks(&mut self, enabled: bool) -> Result<(), SinkError> {
        self.statements.push(statement::foreign_key_checks(enabled));
        self.foreign_key_checks = enabled;
        Ok(())
    }

    async fn insert_rows(
        &mut self,
        statement: &InsertStatement,
        rows: &[Vec<Option<String>>],
    ) -> Result<u64, SinkError> {
        self.statements.push(statement.sql(rows.len()));

        if rows.len() * statement.columns().len() > MAX_PLACEHOLDERS {
            return Err(SinkError::Rejected(
                "Prepared statement contains too many placeholders".to_string(),
            ));
        }

        let table = statement.table();
        let def = self
            .schemas
            .get(table)
            .cloned()
            .ok_or_else(|| SinkError::Rejected(format!("Table '{table}' doesn't exist")))?;

        // A multi-row statement is all-or-nothing.
        let mut staged: Vec<Row> = Vec::with_capacity(rows.len());
        for values in rows {
            if values.len() != statement.columns().len() {
                return Err(SinkError::Rejected(
                    "Column count doesn't match value count".to_string(),
                ));
            }
            let row: Row = statement
                .columns()
                .iter()
                .zip(values)
                .filter_map(|(column, value)| Some((column.clone(), value.clone()?)))
                .collect();
            self.check_row(table, &def, &row, &staged)?;
            staged.push(row);
        }

        let inserted = staged.len() as u64;
        self.pending
            .extend(staged.into_iter().map(|row| (table.to_string(), row)));
        Ok(inserted)
    }

    async fn commit(&mut self) -> Result<(), SinkError> {
        self.statements.push("COMMIT".to_string());
        for (table, row) in self.pending.drain(..) {
            self.committed.entry(table).or_default().push(row);
        }
        self.commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), SinkError> {
        self.statements.push("ROLLBACK".to_string());
        self.pending.clear();
        self.rollbacks += 1;
        Ok(())
    }

    async fn count_rows(&mut self, table: &str) -> Result<u64, SinkError> {
        self.statements.push(statement::count_rows(table));
        match self.committed.get(table) {
            Some(rows) => Ok(rows.len() as u64),
            None => Err(SinkError::Rejected(format!("Table '{table}' doesn't exist"))),
        }
    }
}

/// Source files of a small, referentially consistent AgroVida data set.
pub const AGROVIDA_FIXTURE: &[(&str, &str)] = &[
    (
        "farms.csv",
        "farm_id,farm_name,region\n\
         1,Finca El Roble,Antioquia\n\
         2,Hacienda La Esperanza,Valle del Cauca\n",
    ),
    (
        "technicians.csv",
        "technician_id,technician_name\n\
         1,Laura Gómez\n\
         2,Andrés Pérez\n",
    ),
    (
        "crop_types.csv",
        "crop_type_id,crop_type_name\n\
         1,Coffee\n\
         2,Cacao\n",
    ),
    (
        "varieties.csv",
        "variety_id,variety_name,crop_type_id\n\
         1,Castillo,1\n\
         2,Caturra,1\n\
         3,CCN-51,2\n",
    ),
    (
        "sensors.csv",
        "sensor_id,sensor_type,sensor_status,maintenance_date\n\
         1,humidity,active,2024-01-15\n\
         2,temperature,maintenance,2024-02-20\n",
    ),
    (
        "farm_crops.csv",
        "farm_crop_id,farm_id,crop_type_id,variety_id,production_tons,soil_type,irrigation_system,fertilizer_used,is_organic,technician_id\n\
         1,1,1,1,12.5,Loam,Drip,Compost,1,1\n\
         2,2,2,3,8.0,Clay,Sprinkler,NPK,0,2\n",
    ),
    (
        "sensor_readings.csv",
        "reading_datetime,reading_id,sensor_id,farm_crop_id,reading_value\n\
         2024-03-01 08:00:00,1,1,1,65.2\n\
         2024-03-01 08:00:00,2,2,1,23.4\n\
         2024-03-01 09:00:00,3,1,2,70.1\n",
    ),
];

/// Write [`AGROVIDA_FIXTURE`] into `dir`.
pub fn write_agrovida_fixture(dir: &Path) -> std::io::Result<()> {
    for (file, contents) in AGROVIDA_FIXTURE {
        std::fs::write(dir.join(file), contents)?;
    }
    Ok(())
}

/// Number of data rows each fixture table holds.
pub fn agrovida_fixture_counts() -> Vec<(&'static str, u64)> {
    AGROVIDA_FIXTURE
        .iter()
        .map(|(file, contents)| {
            let table = file.trim_end_matches(".csv");
            (table, contents.lines().skip(1).count() as u64)
        })
        .collect()
}
