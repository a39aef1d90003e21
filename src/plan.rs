//! The fixed load plan.

/// One source file and the table and columns it loads into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSpec {
    pub file: String,
    pub table: String,
    pub columns: Vec<String>,
}

impl TableSpec {
    pub fn new(file: &str, table: &str, columns: &[&str]) -> Self {
        Self {
            file: file.to_string(),
            table: table.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Ordered list of tables to load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadPlan {
    tables: Vec<TableSpec>,
}

impl LoadPlan {
    pub fn new(tables: Vec<TableSpec>) -> Self {
        Self { tables }
    }

    /// The AgroVida data set, ordered so referenced tables load before the
    /// tables that reference them.
    pub fn agrovida() -> Self {
        Self::new(vec![
            TableSpec::new("farms.csv", "farms", &["farm_id", "farm_name", "region"]),
            TableSpec::new(
                "technicians.csv",
                "technicians",
                &["technician_id", "technician_name"],
            ),
            TableSpec::new(
                "crop_types.csv",
                "crop_types",
                &["crop_type_id", "crop_type_name"],
            ),
            TableSpec::new(
                "varieties.csv",
                "varieties",
                &["variety_id", "variety_name", "crop_type_id"],
            ),
            TableSpec::new(
                "sensors.csv",
                "sensors",
                &["sensor_id", "sensor_type", "sensor_status", "maintenance_date"],
            ),
            TableSpec::new(
                "farm_crops.csv",
                "farm_crops",
                &[
                    "farm_crop_id",
                    "farm_id",
                    "crop_type_id",
                    "variety_id",
                    "production_tons",
                    "soil_type",
                    "irrigation_system",
                    "fertilizer_used",
                    "is_organic",
                    "technician_id",
                ],
            ),
            TableSpec::new(
                "sensor_readings.csv",
                "sensor_readings",
                &[
                    "reading_id",
                    "sensor_id",
                    "farm_crop_id",
                    "reading_value",
                    "reading_datetime",
                ],
            ),
        ])
    }

    pub fn tables(&self) -> &[TableSpec] {
        &self.tables
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.table.as_str())
    }
}
