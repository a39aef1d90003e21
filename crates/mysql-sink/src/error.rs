//! Error types for the MySQL load target.

use thiserror::Error;

/// Errors raised by a [`crate::LoadTarget`].
#[derive(Error, Debug)]
pub enum SinkError {
    /// MySQL connection or query error.
    #[error("MySQL error: {0}")]
    MySQL(#[from] mysql_async::Error),

    /// The configured port is not a valid TCP port.
    #[error("invalid port '{0}'")]
    InvalidPort(String),

    /// A statement was rejected by the target.
    #[error("{0}")]
    Rejected(String),
}
