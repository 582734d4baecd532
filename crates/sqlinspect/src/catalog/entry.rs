//! Schema and table entries of the catalog.

use std::collections::HashMap;

use sqlinspect_core::ast::{AlterTableStatement, CreateTableStatement};

use crate::cache::Cached;

/// What the catalog knows about one database.
#[derive(Debug, Clone, Default)]
pub struct SchemaEntry {
    pub(super) name: String,
    pub(super) exists: bool,
    pub(super) created: bool,
    pub(super) tables: HashMap<String, TableEntry>,
    pub(super) tables_loaded: bool,
    pub(super) engine: Cached<String>,
    pub(super) charset: Cached<String>,
    pub(super) collation: Cached<String>,
}

impl SchemaEntry {
    /// A database found on the server; its tables load on demand.
    pub(super) fn existing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exists: true,
            ..Self::default()
        }
    }

    /// A database created by an analyzed statement.
    pub(super) fn created(
        name: impl Into<String>,
        charset: Option<String>,
        collation: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            exists: true,
            created: true,
            tables_loaded: true,
            charset: charset.map_or(Cached::Unloaded, Cached::Loaded),
            collation: collation.map_or(Cached::Unloaded, Cached::Loaded),
            ..Self::default()
        }
    }

    /// The name as first seen.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the database exists at this point of the session.
    #[must_use]
    pub const fn exists(&self) -> bool {
        self.exists
    }

    /// Whether the database was created within the session.
    #[must_use]
    pub const fn is_created(&self) -> bool {
        self.created
    }

    /// Returns the entries of every table seen so far.
    pub fn tables(&self) -> impl Iterator<Item = &TableEntry> {
        self.tables.values()
    }

    /// Marks the database and all its tables absent.
    pub(super) fn drop_all(&mut self) {
        self.exists = false;
        self.tables_loaded = true;
        for table in self.tables.values_mut() {
            table.drop_table();
        }
    }
}

/// What the catalog knows about one table.
#[derive(Debug, Clone)]
pub struct TableEntry {
    pub(super) name: String,
    pub(super) exists: bool,
    pub(super) definition: Cached<CreateTableStatement>,
    pub(super) merged: Option<CreateTableStatement>,
    /// `SHOW CREATE TABLE` text, kept until the session changes the shape.
    pub(super) stored: Option<String>,
    pub(super) size_mb: Cached<f64>,
    pub(super) row_count: Cached<u64>,
    pub(super) alters: Vec<AlterTableStatement>,
}

impl TableEntry {
    /// A table found on the server; its definition loads on demand.
    pub(super) fn existing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exists: true,
            definition: Cached::Unloaded,
            merged: None,
            stored: None,
            size_mb: Cached::Unloaded,
            row_count: Cached::Unloaded,
            alters: Vec::new(),
        }
    }

    /// A table created by an analyzed statement; it is empty.
    pub(super) fn created(name: impl Into<String>, definition: CreateTableStatement) -> Self {
        Self {
            definition: Cached::Loaded(definition),
            size_mb: Cached::Loaded(0.0),
            row_count: Cached::Loaded(0),
            ..Self::existing(name)
        }
    }

    /// A table known not to exist.
    pub(super) fn absent(name: impl Into<String>) -> Self {
        Self {
            exists: false,
            ..Self::existing(name)
        }
    }

    /// The name as first seen.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the table exists at this point of the session.
    #[must_use]
    pub const fn exists(&self) -> bool {
        self.exists
    }

    /// Returns the current shape: the merged definition after ALTERs
    /// when there is one, else the loaded definition.
    #[must_use]
    pub fn definition(&self) -> Option<&CreateTableStatement> {
        self.merged.as_ref().or_else(|| self.definition.loaded())
    }

    /// Returns the current shape for mutation, starting the merged
    /// definition from the loaded one.
    pub(super) fn definition_mut(&mut self) -> Option<&mut CreateTableStatement> {
        if self.merged.is_none() {
            self.merged = self.definition.loaded().cloned();
        }
        self.merged.as_mut()
    }

    /// Returns the definition text as the server reported it, unless the
    /// session has changed the table since.
    #[must_use]
    pub fn stored_definition(&self) -> Option<&str> {
        self.stored.as_deref()
    }

    /// ALTER statements applied to this table in the session.
    #[must_use]
    pub fn alters(&self) -> &[AlterTableStatement] {
        &self.alters
    }

    /// Returns the size estimate in MB, if loaded.
    #[must_use]
    pub const fn size_mb(&self) -> Option<f64> {
        match self.size_mb {
            Cached::Loaded(size) => Some(size),
            _ => None,
        }
    }

    pub(super) fn drop_table(&mut self) {
        self.exists = false;
        self.merged = None;
        self.stored = None;
        self.definition = Cached::Unloaded;
        self.alters.clear();
    }
}
