//! The schema catalog.
//!
//! A [`Catalog`] models the databases, tables and settings a session sees.
//! Entries load lazily from the live connection the first time they are
//! looked up and are never fetched again; afterwards only the effects of
//! analyzed statements change them. A catalog may sit on top of a
//! [`CatalogSnapshot`] taken from an earlier session: lookups that miss
//! locally are answered from the snapshot before the connection is asked.

mod definition;
mod effect;
mod entry;
mod snapshot;

pub use entry::{SchemaEntry, TableEntry};
pub use snapshot::{CatalogSnapshot, CatalogView};

pub(crate) use definition::{apply_alter_spec, parse_create_table, requalify};

use std::collections::HashMap;
use std::sync::Arc;

use sqlinspect_core::ast::{AlterTableStatement, CreateTableStatement, Literal, TableName};
use tracing::{debug, warn};

use crate::cache::Cached;
use crate::connection::{Connection, Row};
use crate::error::{ConnectionError, InspectError, Result};

/// Which kinds of statements a session has seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct History {
    /// A schema-changing statement was analyzed.
    pub has_ddl: bool,
    /// A row-changing statement was analyzed.
    pub has_dml: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct CatalogState {
    pub(crate) schemas: HashMap<String, SchemaEntry>,
    pub(crate) schemas_loaded: bool,
    pub(crate) system_variables: HashMap<String, Option<String>>,
    pub(crate) plans: HashMap<String, Vec<Row>>,
    pub(crate) current_schema: Option<String>,
    pub(crate) lower_case_table_names: Cached<bool>,
    pub(crate) history: History,
}

/// Quotes a value as a SQL string literal.
pub(crate) fn string_literal(value: &str) -> String {
    Literal::String(value.to_string()).to_string()
}

/// The evolving model of a database server within one session.
pub struct Catalog {
    connection: Option<Arc<dyn Connection>>,
    parent: Option<Arc<CatalogSnapshot>>,
    state: CatalogState,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("online", &self.connection.is_some())
            .field("has_parent", &self.parent.is_some())
            .field("current_schema", &self.state.current_schema)
            .finish_non_exhaustive()
    }
}

impl Catalog {
    /// Creates an empty catalog; `None` means offline.
    #[must_use]
    pub fn new(connection: Option<Arc<dyn Connection>>) -> Self {
        Self {
            connection,
            parent: None,
            state: CatalogState::default(),
        }
    }

    /// Creates a catalog that continues from `parent`.
    #[must_use]
    pub fn with_parent(
        connection: Option<Arc<dyn Connection>>,
        parent: Arc<CatalogSnapshot>,
    ) -> Self {
        let state = CatalogState {
            current_schema: parent.state.current_schema.clone(),
            lower_case_table_names: parent.state.lower_case_table_names.clone(),
            ..CatalogState::default()
        };
        Self {
            connection,
            parent: Some(parent),
            state,
        }
    }

    /// Returns true when there is no live connection.
    #[must_use]
    pub const fn is_offline(&self) -> bool {
        self.connection.is_none()
    }

    /// Returns the schema selected by `USE`.
    #[must_use]
    pub fn current_schema(&self) -> Option<&str> {
        self.state.current_schema.as_deref()
    }

    /// Returns which kinds of statements were seen.
    #[must_use]
    pub const fn history(&self) -> History {
        self.state.history
    }

    /// Returns `table` qualified with the current schema when it has no
    /// schema of its own.
    #[must_use]
    pub fn resolve(&self, table: &TableName) -> TableName {
        match (&table.schema, &self.state.current_schema) {
            (None, Some(schema)) => TableName::qualified(schema.clone(), table.name.clone()),
            _ => table.clone(),
        }
    }

    /// Renders `schema.table` for messages.
    #[must_use]
    pub fn display_name(&self, table: &TableName) -> String {
        let resolved = self.resolve(table);
        match resolved.schema {
            Some(schema) => format!("{schema}.{}", resolved.name),
            None => resolved.name,
        }
    }

    /// Flattens this catalog and its parent into an immutable snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        let mut state = self
            .parent
            .as_ref()
            .map(|parent| parent.state.clone())
            .unwrap_or_default();
        state.schemas.extend(self.state.schemas.clone());
        state.schemas_loaded |= self.state.schemas_loaded;
        state
            .system_variables
            .extend(self.state.system_variables.clone());
        state.plans.extend(self.state.plans.clone());
        state.current_schema.clone_from(&self.state.current_schema);
        if !self.state.lower_case_table_names.is_unloaded() {
            state
                .lower_case_table_names
                .clone_from(&self.state.lower_case_table_names);
        }
        state.history.has_ddl |= self.state.history.has_ddl;
        state.history.has_dml |= self.state.history.has_dml;
        Arc::new(CatalogSnapshot { state })
    }

    // ====================================================================
    // Keys and parent read-through
    // ====================================================================

    async fn case_insensitive(&mut self) -> Result<bool> {
        if let Some(insensitive) = self.state.lower_case_table_names.loaded() {
            return Ok(*insensitive);
        }
        let value = self.system_variable("lower_case_table_names").await?;
        let insensitive = value.is_some_and(|v| v.trim() != "0");
        debug!(insensitive, "Table name case rule loaded");
        self.state.lower_case_table_names = Cached::Loaded(insensitive);
        Ok(insensitive)
    }

    pub(crate) fn key(&self, name: &str) -> String {
        match self.state.lower_case_table_names {
            Cached::Loaded(true) => name.to_lowercase(),
            _ => name.to_string(),
        }
    }

    fn schemas_loaded(&self) -> bool {
        self.state.schemas_loaded
            || self
                .parent
                .as_ref()
                .is_some_and(|parent| parent.state.schemas_loaded)
    }

    /// Copies the parent's entry for `key` into this catalog.
    fn adopt_schema(&mut self, key: &str) {
        if self.state.schemas.contains_key(key) {
            return;
        }
        if let Some(entry) = self
            .parent
            .as_ref()
            .and_then(|parent| parent.state.schemas.get(key))
        {
            self.state.schemas.insert(key.to_string(), entry.clone());
        }
    }

    pub(crate) fn schema_entry(&self, key: &str) -> Option<&SchemaEntry> {
        self.state.schemas.get(key).or_else(|| {
            self.parent
                .as_ref()
                .and_then(|parent| parent.state.schemas.get(key))
        })
    }

    pub(crate) fn schema_entry_mut(&mut self, key: &str) -> Option<&mut SchemaEntry> {
        self.adopt_schema(key);
        self.state.schemas.get_mut(key)
    }

    pub(crate) fn insert_schema(&mut self, key: String, entry: SchemaEntry) {
        self.state.schemas.insert(key, entry);
    }

    fn table_entry(&self, schema_key: &str, table_key: &str) -> Option<&TableEntry> {
        self.schema_entry(schema_key)?.tables.get(table_key)
    }

    pub(crate) fn table_entry_mut(
        &mut self,
        schema_key: &str,
        table_key: &str,
    ) -> Option<&mut TableEntry> {
        self.schema_entry_mut(schema_key)?.tables.get_mut(table_key)
    }

    /// Returns the schema and table keys of a table reference.
    pub(crate) fn table_keys(&self, table: &TableName) -> Option<(String, String)> {
        let resolved = self.resolve(table);
        let schema = resolved.schema?;
        Some((self.key(&schema), self.key(&resolved.name)))
    }

    // ====================================================================
    // Lazy loading
    // ====================================================================

    async fn load_schemas(&mut self) -> Result<()> {
        if self.schemas_loaded() {
            return Ok(());
        }
        let Some(connection) = self.connection.clone() else {
            return Ok(());
        };
        let names = connection.list_databases().await?;
        debug!(count = names.len(), "Loaded database list");
        for name in names {
            let key = self.key(&name);
            self.adopt_schema(&key);
            self.state
                .schemas
                .entry(key)
                .or_insert_with(|| SchemaEntry::existing(name));
        }
        self.state.schemas_loaded = true;
        Ok(())
    }

    async fn load_tables(&mut self, schema_key: &str) -> Result<()> {
        let connection = self.connection.clone();
        let Some(schema) = self.schema_entry_mut(schema_key) else {
            return Ok(());
        };
        if schema.tables_loaded || !schema.exists {
            return Ok(());
        }
        let Some(connection) = connection else {
            return Ok(());
        };
        let schema_name = schema.name.clone();
        let names = connection.list_tables(&schema_name).await?;
        debug!(schema = %schema_name, count = names.len(), "Loaded table list");
        let keys: Vec<(String, String)> = names
            .into_iter()
            .map(|name| (self.key(&name), name))
            .collect();
        if let Some(schema) = self.schema_entry_mut(schema_key) {
            for (key, name) in keys {
                schema
                    .tables
                    .entry(key)
                    .or_insert_with(|| TableEntry::existing(name));
            }
            schema.tables_loaded = true;
        }
        Ok(())
    }

    // ====================================================================
    // Lookups
    // ====================================================================

    /// Returns true if the schema exists at this point of the session.
    ///
    /// The first call fetches the database list. Offline only schemas
    /// created in the session are known.
    pub async fn schema_exists(&mut self, name: &str) -> Result<bool> {
        self.case_insensitive().await?;
        self.load_schemas().await?;
        let key = self.key(name);
        Ok(self.schema_entry(&key).is_some_and(SchemaEntry::exists))
    }

    /// Returns true if the table exists at this point of the session.
    ///
    /// An unqualified name resolves against the current schema; without
    /// one the table does not exist.
    pub async fn table_exists(&mut self, table: &TableName) -> Result<bool> {
        let resolved = self.resolve(table);
        let Some(schema) = &resolved.schema else {
            return Ok(false);
        };
        if !self.schema_exists(schema).await? {
            return Ok(false);
        }
        let schema_key = self.key(schema);
        self.load_tables(&schema_key).await?;
        let table_key = self.key(&resolved.name);
        Ok(self
            .table_entry(&schema_key, &table_key)
            .is_some_and(TableEntry::exists))
    }

    /// Returns the current shape of a table, `None` if it does not exist.
    ///
    /// The shape is the merged definition after ALTERs, else the cached
    /// definition, else the parsed `SHOW CREATE TABLE` output.
    pub async fn create_table_shape(
        &mut self,
        table: &TableName,
    ) -> Result<Option<CreateTableStatement>> {
        if !self.table_exists(table).await? {
            return Ok(None);
        }
        let Some((schema_key, table_key)) = self.table_keys(table) else {
            return Ok(None);
        };
        let shown = self.display_name(table);
        let connection = self.connection.clone();
        let Some(entry) = self.table_entry_mut(&schema_key, &table_key) else {
            return Ok(None);
        };
        if let Some(shape) = entry.definition() {
            return Ok(Some(shape.clone()));
        }
        if let Some(reason) = entry.definition.error() {
            return Err(InspectError::UnparsableDefinition {
                table: shown,
                reason: reason.to_string(),
            });
        }
        let Some(connection) = connection else {
            return Ok(None);
        };

        let resolved = self.resolve(table);
        let schema = resolved.schema.unwrap_or_default();
        let text = connection.show_create_table(&schema, &resolved.name).await?;
        let Some(entry) = self.table_entry_mut(&schema_key, &table_key) else {
            return Ok(None);
        };
        let Some(text) = text else {
            debug!(table = %shown, "Table vanished from the server");
            entry.exists = false;
            return Ok(None);
        };
        entry.stored = Some(text.clone());
        match parse_create_table(&text) {
            Ok(shape) => {
                entry.definition = Cached::Loaded(shape.clone());
                Ok(Some(shape))
            }
            Err(reason) => {
                warn!(table = %shown, reason = %reason, "Cannot parse table definition");
                entry.definition = Cached::Errored(reason.clone());
                Err(InspectError::UnparsableDefinition {
                    table: shown,
                    reason,
                })
            }
        }
    }

    /// Returns the `SHOW CREATE TABLE` text of a table the session has
    /// not changed, `None` for tables created or altered in the session.
    pub async fn stored_definition(&mut self, table: &TableName) -> Result<Option<String>> {
        match self.create_table_shape(table).await {
            Ok(Some(_)) | Err(InspectError::UnparsableDefinition { .. }) => {}
            Ok(None) => return Ok(None),
            Err(error) => return Err(error),
        }
        Ok(self
            .table_keys(table)
            .and_then(|(schema_key, table_key)| self.table_entry(&schema_key, &table_key))
            .and_then(TableEntry::stored_definition)
            .map(ToString::to_string))
    }

    /// Returns the ALTER statements applied to a table in the session.
    pub async fn alter_history(&mut self, table: &TableName) -> Result<Vec<AlterTableStatement>> {
        if !self.table_exists(table).await? {
            return Ok(Vec::new());
        }
        Ok(self
            .table_keys(table)
            .and_then(|(schema_key, table_key)| self.table_entry(&schema_key, &table_key))
            .map(|entry| entry.alters.clone())
            .unwrap_or_default())
    }

    async fn load_table_stats(&mut self, table: &TableName) -> Result<()> {
        let Some((schema_key, table_key)) = self.table_keys(table) else {
            return Ok(());
        };
        let loaded = self
            .table_entry(&schema_key, &table_key)
            .is_some_and(|entry| !entry.size_mb.is_unloaded());
        let Some(connection) = self.connection.clone() else {
            return Ok(());
        };
        if loaded {
            return Ok(());
        }
        let resolved = self.resolve(table);
        let sql = format!(
            "SELECT (DATA_LENGTH + INDEX_LENGTH) / 1024 / 1024 AS size_mb, TABLE_ROWS AS table_rows \
             FROM information_schema.TABLES WHERE TABLE_SCHEMA = {} AND TABLE_NAME = {}",
            string_literal(resolved.schema.as_deref().unwrap_or_default()),
            string_literal(&resolved.name),
        );
        let rows = connection.query(&sql).await?;
        let (size, count) = rows.first().map_or((Ok(0.0), Ok(0)), |row| {
            (
                row.text("size_mb")
                    .map_or(Ok(0.0), |text| text.trim().parse::<f64>()),
                row.text("table_rows")
                    .map_or(Ok(0), |text| text.trim().parse::<u64>()),
            )
        });
        if let Some(entry) = self.table_entry_mut(&schema_key, &table_key) {
            entry.size_mb.store(size);
            entry.row_count.store(count);
        }
        Ok(())
    }

    /// Returns the table size estimate in MB.
    ///
    /// `None` if the table does not exist or its size is unknown (offline,
    /// or the server reported something unreadable).
    pub async fn table_size_mb(&mut self, table: &TableName) -> Result<Option<f64>> {
        if !self.table_exists(table).await? {
            return Ok(None);
        }
        self.load_table_stats(table).await?;
        Ok(self
            .table_keys(table)
            .and_then(|(schema_key, table_key)| self.table_entry(&schema_key, &table_key))
            .and_then(TableEntry::size_mb))
    }

    /// Returns the estimated number of rows of a table.
    pub async fn table_row_count(&mut self, table: &TableName) -> Result<Option<u64>> {
        if !self.table_exists(table).await? {
            return Ok(None);
        }
        self.load_table_stats(table).await?;
        Ok(self
            .table_keys(table)
            .and_then(|(schema_key, table_key)| self.table_entry(&schema_key, &table_key))
            .and_then(|entry| entry.row_count.loaded().copied()))
    }

    async fn load_schema_defaults(&mut self, schema_key: &str) -> Result<()> {
        let Some(entry) = self.schema_entry(schema_key) else {
            return Ok(());
        };
        if !entry.exists || self.connection.is_none() {
            return Ok(());
        }
        let name = entry.name.clone();
        let created = entry.created;
        let needs_charset =
            entry.charset.is_unloaded() || entry.collation.is_unloaded();
        let needs_engine = entry.engine.is_unloaded();

        if needs_engine {
            let engine = self.system_variable("default_storage_engine").await?;
            if let Some(entry) = self.schema_entry_mut(schema_key) {
                entry.engine.store(engine.ok_or("default_storage_engine is not set"));
            }
        }
        if !needs_charset {
            return Ok(());
        }
        let (charset, collation) = if created {
            (
                self.system_variable("character_set_server").await?,
                self.system_variable("collation_server").await?,
            )
        } else {
            let Some(connection) = self.connection.clone() else {
                return Ok(());
            };
            let sql = format!(
                "SELECT DEFAULT_CHARACTER_SET_NAME, DEFAULT_COLLATION_NAME \
                 FROM information_schema.SCHEMATA WHERE SCHEMA_NAME = {}",
                string_literal(&name)
            );
            let rows = connection.query(&sql).await?;
            rows.first().map_or((None, None), |row| {
                (
                    row.text("DEFAULT_CHARACTER_SET_NAME"),
                    row.text("DEFAULT_COLLATION_NAME"),
                )
            })
        };
        if let Some(entry) = self.schema_entry_mut(schema_key) {
            if entry.charset.is_unloaded() {
                entry.charset.store(charset.ok_or("no default character set"));
            }
            if entry.collation.is_unloaded() {
                entry.collation.store(collation.ok_or("no default collation"));
            }
        }
        Ok(())
    }

    async fn schema_default(
        &mut self,
        schema: &str,
        pick: fn(&SchemaEntry) -> &Cached<String>,
    ) -> Result<Option<String>> {
        if !self.schema_exists(schema).await? {
            return Ok(None);
        }
        let key = self.key(schema);
        self.load_schema_defaults(&key).await?;
        Ok(self
            .schema_entry(&key)
            .and_then(|entry| pick(entry).loaded().cloned()))
    }

    /// Returns the default storage engine of a schema.
    pub async fn schema_engine(&mut self, schema: &str) -> Result<Option<String>> {
        self.schema_default(schema, |entry| &entry.engine).await
    }

    /// Returns the default character set of a schema.
    pub async fn schema_charset(&mut self, schema: &str) -> Result<Option<String>> {
        self.schema_default(schema, |entry| &entry.charset).await
    }

    /// Returns the default collation of a schema.
    pub async fn schema_collation(&mut self, schema: &str) -> Result<Option<String>> {
        self.schema_default(schema, |entry| &entry.collation).await
    }

    /// Returns a global system variable, fetched once per session.
    pub async fn system_variable(&mut self, name: &str) -> Result<Option<String>> {
        let key = name.to_ascii_lowercase();
        if let Some(value) = self.state.system_variables.get(&key) {
            return Ok(value.clone());
        }
        if let Some(value) = self
            .parent
            .as_ref()
            .and_then(|parent| parent.state.system_variables.get(&key))
        {
            return Ok(value.clone());
        }
        let Some(connection) = self.connection.clone() else {
            return Ok(None);
        };
        let value = connection.system_variable(name).await?;
        self.state.system_variables.insert(key, value.clone());
        Ok(value)
    }

    /// Returns the execution plan of `sql`, memoized per current schema
    /// and statement text.
    ///
    /// `None` offline or when the server rejects the statement, e.g.
    /// because it touches a table created earlier in the session.
    pub async fn explain(&mut self, sql: &str) -> Result<Option<Vec<Row>>> {
        let fingerprint = format!(
            "{}.{sql}",
            self.state.current_schema.as_deref().unwrap_or_default()
        );
        if let Some(plan) = self.state.plans.get(&fingerprint) {
            return Ok(Some(plan.clone()));
        }
        if let Some(plan) = self
            .parent
            .as_ref()
            .and_then(|parent| parent.state.plans.get(&fingerprint))
        {
            return Ok(Some(plan.clone()));
        }
        let Some(connection) = self.connection.clone() else {
            return Ok(None);
        };
        match connection.query(&format!("EXPLAIN {sql}")).await {
            Ok(plan) => {
                self.state.plans.insert(fingerprint, plan.clone());
                Ok(Some(plan))
            }
            Err(ConnectionError::Sqlx(sqlx::Error::Database(error))) => {
                warn!(error = %error, sql = %sql, "EXPLAIN rejected");
                Ok(None)
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Runs a query against the live connection without caching.
    ///
    /// Offline there is nothing to read and no rows are returned.
    pub async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        match &self.connection {
            Some(connection) => Ok(connection.query(sql).await?),
            None => Ok(Vec::new()),
        }
    }
}
