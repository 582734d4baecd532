//! Frozen catalogs and the read-only view handed to rules.

use sqlinspect_core::ast::{AlterTableStatement, CreateTableStatement, TableName};

use super::{Catalog, CatalogState, History, SchemaEntry};
use crate::connection::Row;
use crate::error::{InspectError, Result};

/// An immutable, flattened copy of a catalog.
///
/// Snapshots are shared as `Arc<CatalogSnapshot>` and used as the parent
/// of later catalogs. Taking a snapshot of a catalog that has a parent
/// merges both, so parent chains never grow past one level.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub(super) state: CatalogState,
}

impl CatalogSnapshot {
    /// Returns the schema selected by `USE` when the snapshot was taken.
    #[must_use]
    pub fn current_schema(&self) -> Option<&str> {
        self.state.current_schema.as_deref()
    }

    /// Returns which kinds of statements had been seen.
    #[must_use]
    pub const fn history(&self) -> History {
        self.state.history
    }

    /// Returns the entry of a schema seen before the snapshot, by key.
    #[must_use]
    pub fn schema(&self, key: &str) -> Option<&SchemaEntry> {
        self.state.schemas.get(key)
    }
}

/// Read access to a catalog for rules and rollback generation.
///
/// Lookups may still load entries from the connection, but nothing
/// reachable from a view applies a statement's effect.
#[derive(Debug)]
pub struct CatalogView<'a> {
    catalog: &'a mut Catalog,
}

impl<'a> CatalogView<'a> {
    pub(crate) fn new(catalog: &'a mut Catalog) -> Self {
        Self { catalog }
    }

    /// Returns true when there is no live connection.
    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.catalog.is_offline()
    }

    /// Returns the schema selected by `USE`.
    #[must_use]
    pub fn current_schema(&self) -> Option<&str> {
        self.catalog.current_schema()
    }

    /// Returns `table` qualified with the current schema.
    #[must_use]
    pub fn resolve(&self, table: &TableName) -> TableName {
        self.catalog.resolve(table)
    }

    /// Renders `schema.table` for messages.
    #[must_use]
    pub fn display_name(&self, table: &TableName) -> String {
        self.catalog.display_name(table)
    }

    /// See [`Catalog::schema_exists`].
    pub async fn schema_exists(&mut self, name: &str) -> Result<bool> {
        self.catalog.schema_exists(name).await
    }

    /// See [`Catalog::table_exists`].
    pub async fn table_exists(&mut self, table: &TableName) -> Result<bool> {
        self.catalog.table_exists(table).await
    }

    /// See [`Catalog::create_table_shape`].
    pub async fn create_table_shape(
        &mut self,
        table: &TableName,
    ) -> Result<Option<CreateTableStatement>> {
        self.catalog.create_table_shape(table).await
    }

    /// Like [`Self::create_table_shape`], but a stored definition that
    /// cannot be parsed reads as unknown.
    pub async fn readable_shape(
        &mut self,
        table: &TableName,
    ) -> Result<Option<CreateTableStatement>> {
        match self.catalog.create_table_shape(table).await {
            Err(InspectError::UnparsableDefinition { .. }) => Ok(None),
            other => other,
        }
    }

    /// See [`Catalog::stored_definition`].
    pub async fn stored_definition(&mut self, table: &TableName) -> Result<Option<String>> {
        self.catalog.stored_definition(table).await
    }

    /// See [`Catalog::alter_history`].
    pub async fn alter_history(&mut self, table: &TableName) -> Result<Vec<AlterTableStatement>> {
        self.catalog.alter_history(table).await
    }

    /// See [`Catalog::table_size_mb`].
    pub async fn table_size_mb(&mut self, table: &TableName) -> Result<Option<f64>> {
        self.catalog.table_size_mb(table).await
    }

    /// See [`Catalog::table_row_count`].
    pub async fn table_row_count(&mut self, table: &TableName) -> Result<Option<u64>> {
        self.catalog.table_row_count(table).await
    }

    /// See [`Catalog::system_variable`].
    pub async fn system_variable(&mut self, name: &str) -> Result<Option<String>> {
        self.catalog.system_variable(name).await
    }

    /// See [`Catalog::explain`].
    pub async fn explain(&mut self, sql: &str) -> Result<Option<Vec<Row>>> {
        self.catalog.explain(sql).await
    }

    /// See [`Catalog::query`].
    pub async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        self.catalog.query(sql).await
    }
}
