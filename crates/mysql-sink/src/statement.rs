//! SQL text issued by the loader.

/// Most `?` placeholders MySQL accepts in one prepared statement.
pub const MAX_PLACEHOLDERS: usize = 65_535;

/// Quote a table or column name with backticks, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// `SET FOREIGN_KEY_CHECKS` for the current session.
pub fn foreign_key_checks(enabled: bool) -> String {
    format!("SET FOREIGN_KEY_CHECKS = {}", u8::from(enabled))
}

/// Row count query used for load verification.
pub fn count_rows(table: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", quote_identifier(table))
}

/// A parameterized INSERT into a fixed table and column list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertStatement {
    table: String,
    columns: Vec<String>,
}

impl InsertStatement {
    pub fn new<S: AsRef<str>>(table: &str, columns: &[S]) -> Self {
        Self {
            table: table.to_string(),
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Largest row count [`InsertStatement::sql`] can take without exceeding
    /// [`MAX_PLACEHOLDERS`].
    pub fn max_rows_per_statement(&self) -> usize {
        (MAX_PLACEHOLDERS / self.columns.len().max(1)).max(1)
    }

    /// Build the statement text for `rows` rows of placeholders.
    ///
    /// `rows == 1` yields `INSERT INTO t (a, b) VALUES (?, ?)`; larger values
    /// repeat the placeholder group once per row.
    pub fn sql(&self, rows: usize) -> String {
        let col_placeholders: Vec<&str> = self.columns.iter().map(|_| "?").collect();
        let row_template = format!("({})", col_placeholders.join(", "));
        let rows_template: Vec<&str> = (0..rows.max(1)).map(|_| row_template.as_str()).collect();

        format!(
            "INSERT INTO {} ({}) VALUES {}",
            quote_identifier(&self.table),
            self.columns
                .iter()
                .map(|c| quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", "),
            rows_template.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_row_insert() {
        let stmt = InsertStatement::new("farms", &["farm_id", "farm_name", "region"]);
        assert_eq!(
            stmt.sql(1),
            "INSERT INTO `farms` (`farm_id`, `farm_name`, `region`) VALUES (?, ?, ?)"
        );
    }

    #[test]
    fn test_multi_row_insert() {
        let stmt = InsertStatement::new("technicians", &["technician_id", "technician_name"]);
        assert_eq!(
            stmt.sql(3),
            "INSERT INTO `technicians` (`technician_id`, `technician_name`) VALUES (?, ?), (?, ?), (?, ?)"
        );
    }

    #[test]
    fn test_max_rows_per_statement() {
        let farm_crops = InsertStatement::new(
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
        );
        assert_eq!(farm_crops.max_rows_per_statement(), 6_553);

        let single = InsertStatement::new("farms", &["farm_id"]);
        assert_eq!(single.max_rows_per_statement(), MAX_PLACEHOLDERS);
    }

    #[test]
    fn test_quote_identifier_escapes_backticks() {
        assert_eq!(quote_identifier("odd`name"), "`odd``name`");
    }

    #[test]
    fn test_foreign_key_checks() {
        assert_eq!(foreign_key_checks(false), "SET FOREIGN_KEY_CHECKS = 0");
        assert_eq!(foreign_key_checks(true), "SET FOREIGN_KEY_CHECKS = 1");
    }

    #[test]
    fn test_count_rows() {
        assert_eq!(count_rows("sensor_readings"), "SELECT COUNT(*) FROM `sensor_readings`");
    }
}
