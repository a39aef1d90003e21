//! Command-line and environment configuration
//!
//! Every option can be given as a flag or through its environment variable;
//! running with neither uses the local development defaults.

use agrovida_mysql_sink::ConnectOpts;
use clap::{Args, Parser};
use std::path::PathBuf;

/// Directory holding the seven source CSV files, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "./database/data";

#[derive(Parser, Clone, Debug)]
#[command(name = "agrovida-loader")]
#[command(about = "Bulk-load the AgroVida CSV data set into MySQL")]
#[command(long_about = None)]
pub struct LoaderArgs {
    #[command(flatten)]
    pub database: DatabaseOpts,

    #[command(flatten)]
    pub load: LoadOpts,
}

/// MySQL connection parameters.
#[derive(Args, Clone, Debug)]
pub struct DatabaseOpts {
    /// MySQL host
    #[arg(long, default_value = "localhost", env = "DB_HOST")]
    pub db_host: String,

    /// MySQL user
    #[arg(long, default_value = "agrovida_user", env = "DB_USER")]
    pub db_user: String,

    /// MySQL password
    #[arg(long, default_value = "agrovida_password", env = "DB_PASSWORD")]
    pub db_password: String,

    /// Target database name
    #[arg(long, default_value = "agrovida_database", env = "DB_NAME")]
    pub db_name: String,

    /// MySQL port (parsed when connecting)
    #[arg(long, default_value = "3306", env = "DB_PORT")]
    pub db_port: String,
}

impl DatabaseOpts {
    /// Session parameters for the load: TLS off, autocommit off.
    pub fn connect_opts(&self) -> ConnectOpts {
        ConnectOpts {
            host: self.db_host.clone(),
            user: self.db_user.clone(),
            password: self.db_password.clone(),
            database: self.db_name.clone(),
            port: self.db_port.clone(),
            ssl_disabled: true,
            autocommit: false,
        }
    }
}

/// Options controlling how the CSV files are loaded.
#[derive(Args, Clone, Debug)]
pub struct LoadOpts {
    /// Directory containing the source CSV files
    #[arg(long, default_value = DEFAULT_DATA_DIR, env = "AGROVIDA_DATA_DIR")]
    pub data_dir: PathBuf,

    /// Rows per INSERT statement
    #[arg(long, default_value = "1", env = "AGROVIDA_BATCH_SIZE", value_parser = parse_batch_size)]
    pub batch_size: usize,

    /// Exit with a non-zero status if any table failed to load
    #[arg(long, env = "AGROVIDA_STRICT")]
    pub strict: bool,
}

fn parse_batch_size(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("batch size must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("invalid batch size '{value}': {e}")),
    }
}
