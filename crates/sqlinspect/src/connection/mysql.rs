//! MySQL connection over a `sqlx` pool.

use std::future::Future;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use sqlinspect_core::ast::Quoted;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column as _, Row as _};
use tracing::debug;

use super::{Connection, ConnectionResult, Row};
use crate::error::ConnectionError;

/// SQLSTATE of "table doesn't exist" (error 1146).
const NO_SUCH_TABLE: &str = "42S02";

/// A [`Connection`] to a MySQL server.
///
/// Statements go through the text protocol so any statement text can be
/// sent and every value comes back as raw bytes. `USE` changes session
/// state, so sessions should be given a pool with a single connection.
#[derive(Debug, Clone)]
pub struct MySqlConnection {
    pool: MySqlPool,
    timeout: Duration,
}

impl MySqlConnection {
    /// Wraps an existing pool.
    #[must_use]
    pub const fn new(pool: MySqlPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Connects with a single-connection pool.
    pub async fn connect(url: &str, timeout: Duration) -> ConnectionResult<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(timeout)
            .connect(url)
            .await?;
        Ok(Self::new(pool, timeout))
    }

    async fn with_deadline<T, F>(&self, call: F) -> ConnectionResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ConnectionError::Timeout(self.timeout.as_secs())),
        }
    }

    async fn fetch_rows(&self, sql: &str) -> ConnectionResult<Vec<Row>> {
        debug!(sql = %sql, "Executing SQL");
        let rows = self
            .with_deadline(sqlx::raw_sql(sql).fetch_all(&self.pool))
            .await?;
        rows.iter().map(convert_row).collect()
    }

    async fn first_column(&self, sql: &str) -> ConnectionResult<Vec<String>> {
        let rows = self.fetch_rows(sql).await?;
        rows.iter()
            .map(|row| {
                row.text_at(0)
                    .ok_or_else(|| ConnectionError::UnexpectedShape(format!("empty name in `{sql}`")))
            })
            .collect()
    }
}

fn convert_row(row: &MySqlRow) -> ConnectionResult<Row> {
    let columns = row
        .columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect();
    let values = (0..row.len())
        .map(|index| row.try_get_unchecked::<Option<Vec<u8>>, _>(index))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Row::new(columns, values))
}

fn is_no_such_table(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(NO_SUCH_TABLE),
        _ => false,
    }
}

impl Connection for MySqlConnection {
    fn list_databases(&self) -> BoxFuture<'_, ConnectionResult<Vec<String>>> {
        self.first_column("SHOW DATABASES").boxed()
    }

    fn list_tables<'a>(&'a self, schema: &'a str) -> BoxFuture<'a, ConnectionResult<Vec<String>>> {
        async move {
            let sql = format!(
                "SHOW FULL TABLES FROM {} WHERE Table_type = 'BASE TABLE'",
                Quoted(schema)
            );
            self.first_column(&sql).await
        }
        .boxed()
    }

    fn show_create_table<'a>(
        &'a self,
        schema: &'a str,
        table: &'a str,
    ) -> BoxFuture<'a, ConnectionResult<Option<String>>> {
        async move {
            let sql = format!("SHOW CREATE TABLE {}.{}", Quoted(schema), Quoted(table));
            let rows = match self.fetch_rows(&sql).await {
                Ok(rows) => rows,
                Err(ConnectionError::Sqlx(error)) if is_no_such_table(&error) => {
                    debug!(schema = %schema, table = %table, "Table not found");
                    return Ok(None);
                }
                Err(error) => return Err(error),
            };
            rows.first()
                .and_then(|row| row.text_at(1))
                .map(Some)
                .ok_or_else(|| {
                    ConnectionError::UnexpectedShape(format!("no definition in `{sql}`"))
                })
        }
        .boxed()
    }

    fn query<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, ConnectionResult<Vec<Row>>> {
        self.fetch_rows(sql).boxed()
    }

    fn execute<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, ConnectionResult<u64>> {
        async move {
            debug!(sql = %sql, "Executing SQL");
            let result = self
                .with_deadline(sqlx::raw_sql(sql).execute(&self.pool))
                .await?;
            Ok(result.rows_affected())
        }
        .boxed()
    }

    fn system_variable<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, ConnectionResult<Option<String>>> {
        async move {
            let sql = format!(
                "SHOW GLOBAL VARIABLES LIKE '{}'",
                name.replace('\\', "\\\\").replace('\'', "''")
            );
            let rows = self.fetch_rows(&sql).await?;
            Ok(rows.first().and_then(|row| row.text("Value")))
        }
        .boxed()
    }
}
