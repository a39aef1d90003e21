//! MySQL session management
//!
//! One `mysql_async` connection, opened with autocommit off so that each
//! table's inserts stay pending until the loader commits them.

use crate::error::SinkError;
use crate::statement::{self, InsertStatement};
use crate::target::LoadTarget;
use async_trait::async_trait;
use mysql_async::{prelude::*, Conn, Opts, OptsBuilder, Params, SslOpts, Value};
use tracing::{debug, info};

/// Connection parameters for the load session.
///
/// The port is kept as text and only parsed when connecting.
#[derive(Clone, Debug)]
pub struct ConnectOpts {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub port: String,
    pub ssl_disabled: bool,
    pub autocommit: bool,
}

impl ConnectOpts {
    pub fn to_mysql_opts(&self) -> Result<Opts, SinkError> {
        let port: u16 = self
            .port
            .trim()
            .parse()
            .map_err(|_| SinkError::InvalidPort(self.port.clone()))?;

        let ssl_opts = if self.ssl_disabled {
            None
        } else {
            Some(SslOpts::default())
        };

        let mut builder = OptsBuilder::default()
            .ip_or_hostname(self.host.clone())
            .tcp_port(port)
            .user(Some(self.user.clone()))
            .pass(Some(self.password.clone()))
            .db_name(Some(self.database.clone()))
            .ssl_opts(ssl_opts);

        if !self.autocommit {
            builder = builder.init(vec!["SET autocommit = 0"]);
        }

        Ok(builder.into())
    }
}

/// A single MySQL connection used for the whole load.
pub struct MySqlSession {
    conn: Conn,
}

impl MySqlSession {
    pub async fn connect(opts: &ConnectOpts) -> Result<Self, SinkError> {
        let mysql_opts = opts.to_mysql_opts()?;
        info!(
            "Connecting to MySQL at {}:{} (database {})",
            opts.host, opts.port, opts.database
        );
        let conn = Conn::new(mysql_opts).await?;
        Ok(Self { conn })
    }

    pub async fn disconnect(self) -> Result<(), SinkError> {
        self.conn.disconnect().await?;
        Ok(())
    }
}

#[async_trait]
impl LoadTarget for MySqlSession {
    async fn set_foreign_key_checks(&mut self, enabled: bool) -> Result<(), SinkError> {
        self.conn
            .query_drop(statement::foreign_key_checks(enabled))
            .await?;
        Ok(())
    }

    async fn insert_rows(
        &mut self,
        statement: &InsertStatement,
        rows: &[Vec<Option<String>>],
    ) -> Result<u64, SinkError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let sql = statement.sql(rows.len());
        let mut params: Vec<Value> = Vec::with_capacity(rows.len() * statement.columns().len());
        for row in rows {
            params.extend(row.iter().map(|v| match v {
                Some(text) => Value::Bytes(text.as_bytes().to_vec()),
                None => Value::NULL,
            }));
        }

        debug!("Executing {sql} with {} rows", rows.len());
        self.conn.exec_drop(&sql, Params::Positional(params)).await?;

        Ok(rows.len() as u64)
    }

    async fn commit(&mut self) -> Result<(), SinkError> {
        self.conn.query_drop("COMMIT").await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), SinkError> {
        self.conn.query_drop("ROLLBACK").await?;
        Ok(())
    }

    async fn count_rows(&mut self, table: &str) -> Result<u64, SinkError> {
        let count: Option<u64> = self.conn.query_first(statement::count_rows(table)).await?;
        Ok(count.unwrap_or(0))
    }
}
