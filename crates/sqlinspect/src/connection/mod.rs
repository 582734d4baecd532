//! Live database access.
//!
//! The engine only ever reads metadata and row snapshots. Every call goes
//! through [`Connection`] so sessions can run against a MySQL server, an
//! in-memory double in tests, or nothing at all (offline).

mod mysql;

pub use mysql::MySqlConnection;

use futures::future::BoxFuture;

use crate::error::ConnectionError;

/// Result type for connection calls.
pub type ConnectionResult<T> = std::result::Result<T, ConnectionError>;

/// A result row with raw column values.
///
/// Values are kept as bytes since the text protocol returns every value
/// as text and binary columns must survive unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Option<Vec<u8>>>,
}

impl Row {
    /// Creates a row from column names and values of the same length.
    #[must_use]
    pub const fn new(columns: Vec<String>, values: Vec<Option<Vec<u8>>>) -> Self {
        Self { columns, values }
    }

    /// Creates a row of text values.
    #[must_use]
    pub fn from_text<'a>(pairs: impl IntoIterator<Item = (&'a str, Option<&'a str>)>) -> Self {
        let (columns, values) = pairs
            .into_iter()
            .map(|(column, value)| (column.to_string(), value.map(|v| v.as_bytes().to_vec())))
            .unzip();
        Self { columns, values }
    }

    /// Returns the column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the value at `index`; the inner `None` is SQL NULL.
    #[must_use]
    pub fn value_at(&self, index: usize) -> Option<Option<&[u8]>> {
        self.values.get(index).map(Option::as_deref)
    }

    /// Returns a column value by name (case-insensitive).
    #[must_use]
    pub fn get(&self, column: &str) -> Option<Option<&[u8]>> {
        let index = self
            .columns
            .iter()
            .position(|name| name.eq_ignore_ascii_case(column))?;
        self.value_at(index)
    }

    /// Returns the value at `index` as text, `None` for NULL.
    #[must_use]
    pub fn text_at(&self, index: usize) -> Option<String> {
        self.value_at(index)
            .flatten()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Returns a column value by name as text, `None` for NULL or a
    /// missing column.
    #[must_use]
    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column)
            .flatten()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

/// The capabilities the engine needs from a live database.
///
/// Implementations must tell "not found" (an `Ok` result) apart from a
/// failure (an `Err`).
pub trait Connection: Send + Sync {
    /// Lists database names.
    fn list_databases(&self) -> BoxFuture<'_, ConnectionResult<Vec<String>>>;

    /// Lists base table names of a database.
    fn list_tables<'a>(&'a self, schema: &'a str) -> BoxFuture<'a, ConnectionResult<Vec<String>>>;

    /// Returns the `SHOW CREATE TABLE` text, `None` if the table is absent.
    fn show_create_table<'a>(
        &'a self,
        schema: &'a str,
        table: &'a str,
    ) -> BoxFuture<'a, ConnectionResult<Option<String>>>;

    /// Runs a query and returns all rows.
    fn query<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, ConnectionResult<Vec<Row>>>;

    /// Runs a statement and returns the number of affected rows.
    fn execute<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, ConnectionResult<u64>>;

    /// Returns a global system variable, `None` if it is unknown.
    fn system_variable<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, ConnectionResult<Option<String>>>;
}
