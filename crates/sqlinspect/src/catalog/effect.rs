//! Folding the effect of analyzed statements into the catalog.
//!
//! Every effect performs its lookups first and only then mutates, so a
//! lookup that fails (connection lost, timeout) leaves the catalog as it
//! was before the statement.

use sqlinspect_core::ast::{
    AlterTableStatement, CreateDatabaseStatement, CreateTableStatement, Quoted, TableName,
};
use sqlinspect_core::Statement;
use tracing::debug;

use super::definition::{apply_alter_spec, create_index, drop_index};
use super::{Catalog, SchemaEntry, TableEntry};
use crate::error::{InspectError, Result};

impl Catalog {
    /// Applies the effect of an analyzed statement.
    ///
    /// Statements that do not apply (creating an existing table, dropping
    /// a missing one) leave the catalog unchanged; validation reports them.
    pub(crate) async fn apply_effect(&mut self, statement: &Statement) -> Result<()> {
        self.case_insensitive().await?;
        match statement {
            Statement::Use { schema } => self.use_schema(schema).await?,
            Statement::CreateDatabase(create) => self.create_database(create).await?,
            Statement::DropDatabase(drop) => self.drop_database(&drop.name).await?,
            Statement::CreateTable(create) => self.create_table(create).await?,
            Statement::DropTable(drop) => {
                let mut present = Vec::new();
                for table in &drop.tables {
                    if self.table_exists(table).await? {
                        present.push(table);
                    }
                }
                for table in present {
                    self.mark_absent(table);
                }
            }
            Statement::RenameTable(rename) => {
                for pair in &rename.pairs {
                    self.prepare_move(&pair.from, &pair.to).await?;
                }
                for pair in &rename.pairs {
                    self.move_table(&pair.from, &pair.to);
                }
            }
            Statement::AlterTable(alter) => self.alter_table(alter).await?,
            Statement::CreateIndex(index) => {
                if self.load_shape(&index.table).await? {
                    self.update_shape(&index.table, |definition| create_index(definition, index));
                }
            }
            Statement::DropIndex(drop) => {
                if self.load_shape(&drop.table).await? {
                    self.update_shape(&drop.table, |definition| {
                        drop_index(definition, &drop.name);
                    });
                }
            }
            Statement::Select(_)
            | Statement::Insert(_)
            | Statement::Update(_)
            | Statement::Delete(_)
            | Statement::Set(_)
            | Statement::Transaction(_)
            | Statement::Unparsed { .. } => {}
        }
        self.state.history.has_ddl |= statement.is_ddl();
        self.state.history.has_dml |= statement.is_dml();
        Ok(())
    }

    /// Selects the current schema.
    ///
    /// When the schema exists on the server the live connection switches
    /// too, so plans and row reads resolve unqualified names the same way.
    pub async fn use_schema(&mut self, name: &str) -> Result<()> {
        let on_server = self.schema_exists(name).await? && {
            let key = self.key(name);
            self.schema_entry(&key)
                .is_some_and(|schema| !schema.is_created())
        };
        if on_server {
            if let Some(connection) = self.connection.clone() {
                connection.execute(&format!("USE {}", Quoted(name))).await?;
            }
        }
        debug!(schema = %name, "Current schema changed");
        self.state.current_schema = Some(name.to_string());
        Ok(())
    }

    async fn create_database(&mut self, create: &CreateDatabaseStatement) -> Result<()> {
        if self.schema_exists(&create.name).await? {
            return Ok(());
        }
        let key = self.key(&create.name);
        self.insert_schema(
            key,
            SchemaEntry::created(
                create.name.clone(),
                create.option_value("CHARSET"),
                create.option_value("COLLATE"),
            ),
        );
        Ok(())
    }

    async fn drop_database(&mut self, name: &str) -> Result<()> {
        if !self.schema_exists(name).await? {
            return Ok(());
        }
        let key = self.key(name);
        if let Some(schema) = self.schema_entry_mut(&key) {
            schema.drop_all();
        }
        Ok(())
    }

    /// Makes sure the schema a table effect lands in is known.
    ///
    /// Offline, a schema never seen before is assumed to exist and gets an
    /// empty placeholder entry. Returns false when the schema is absent.
    async fn ensure_schema(&mut self, name: &str) -> Result<bool> {
        if self.schema_exists(name).await? {
            return Ok(true);
        }
        let key = self.key(name);
        if !self.is_offline() || self.schema_entry(&key).is_some() {
            return Ok(false);
        }
        debug!(schema = %name, "Assuming unknown schema exists");
        self.insert_schema(key, SchemaEntry::created(name, None, None));
        Ok(true)
    }

    /// Loads the shape of a table before changing it.
    ///
    /// A definition that cannot be parsed is not an error here; the table
    /// simply keeps no shape. Returns whether the table exists.
    async fn load_shape(&mut self, table: &TableName) -> Result<bool> {
        match self.create_table_shape(table).await {
            Ok(_) | Err(InspectError::UnparsableDefinition { .. }) => self.table_exists(table).await,
            Err(error) => Err(error),
        }
    }

    fn update_shape(&mut self, table: &TableName, update: impl FnOnce(&mut CreateTableStatement)) {
        let Some((schema_key, table_key)) = self.table_keys(table) else {
            return;
        };
        let Some(entry) = self.table_entry_mut(&schema_key, &table_key) else {
            return;
        };
        entry.stored = None;
        if let Some(definition) = entry.definition_mut() {
            update(definition);
        }
    }

    fn mark_absent(&mut self, table: &TableName) {
        let Some((schema_key, table_key)) = self.table_keys(table) else {
            return;
        };
        let name = self.resolve(table).name;
        if let Some(schema) = self.schema_entry_mut(&schema_key) {
            schema
                .tables
                .entry(table_key)
                .or_insert_with(|| TableEntry::absent(name))
                .drop_table();
        }
    }

    async fn create_table(&mut self, create: &CreateTableStatement) -> Result<()> {
        let resolved = self.resolve(&create.table);
        let Some(schema) = resolved.schema.clone() else {
            return Ok(());
        };
        if !self.ensure_schema(&schema).await? || self.table_exists(&resolved).await? {
            return Ok(());
        }
        let entry = match &create.like {
            None => {
                let mut definition = create.clone();
                definition.if_not_exists = false;
                TableEntry::created(resolved.name.clone(), definition)
            }
            Some(source) => match self.create_table_shape(source).await {
                Ok(Some(mut definition)) => {
                    definition.table = create.table.clone();
                    definition.temporary = create.temporary;
                    definition.if_not_exists = false;
                    TableEntry::created(resolved.name.clone(), definition)
                }
                Ok(None) if self.is_offline() => TableEntry::existing(resolved.name.clone()),
                Ok(None) => return Ok(()),
                Err(InspectError::UnparsableDefinition { .. }) => {
                    TableEntry::existing(resolved.name.clone())
                }
                Err(error) => return Err(error),
            },
        };
        let schema_key = self.key(&schema);
        let table_key = self.key(&resolved.name);
        if let Some(schema) = self.schema_entry_mut(&schema_key) {
            schema.tables.insert(table_key, entry);
        }
        Ok(())
    }

    /// Loads what moving `from` to `to` reads, without changing anything
    /// the session can see.
    async fn prepare_move(&mut self, from: &TableName, to: &TableName) -> Result<()> {
        self.load_shape(from).await?;
        let target = self.resolve(to);
        if let Some(schema) = &target.schema {
            if self.ensure_schema(schema).await? {
                let key = self.key(schema);
                self.load_tables(&key).await?;
            }
        }
        Ok(())
    }

    /// Moves a table entry to a new name, shape and history included.
    ///
    /// Reads only what [`Self::prepare_move`] loaded; a source or target
    /// schema that is not known to exist leaves the catalog unchanged.
    fn move_table(&mut self, from: &TableName, to: &TableName) {
        let target = self.resolve(to);
        let Some(target_schema) = target.schema.clone() else {
            return;
        };
        let target_schema_key = self.key(&target_schema);
        if !self
            .schema_entry(&target_schema_key)
            .is_some_and(SchemaEntry::exists)
        {
            return;
        }
        let Some((schema_key, table_key)) = self.table_keys(from) else {
            return;
        };
        let target_table_key = self.key(&target.name);
        let Some(source) = self
            .table_entry_mut(&schema_key, &table_key)
            .filter(|entry| entry.exists())
        else {
            return;
        };
        let mut moved = source.clone();
        source.drop_table();
        moved.name.clone_from(&target.name);
        if let Some(definition) = moved.definition_mut() {
            definition.table = to.clone();
        }
        debug!(from = %from, to = %to, "Table renamed");
        if let Some(schema) = self.schema_entry_mut(&target_schema_key) {
            schema.tables.insert(target_table_key, moved);
        }
    }

    async fn alter_table(&mut self, alter: &AlterTableStatement) -> Result<()> {
        if !self.load_shape(&alter.table).await? {
            return Ok(());
        }
        let renamed_to = alter.renamed_to().cloned();
        if let Some(to) = &renamed_to {
            let target = self.resolve(to);
            if let Some(schema) = &target.schema {
                self.ensure_schema(schema).await?;
                let key = self.key(schema);
                self.load_tables(&key).await?;
            }
        }
        let Some((schema_key, table_key)) = self.table_keys(&alter.table) else {
            return Ok(());
        };
        if let Some(entry) = self.table_entry_mut(&schema_key, &table_key) {
            entry.stored = None;
            if let Some(definition) = entry.definition_mut() {
                for spec in &alter.specs {
                    apply_alter_spec(definition, spec);
                }
            }
            entry.alters.push(alter.clone());
        }
        if let Some(to) = renamed_to {
            self.move_table(&alter.table, &to);
        }
        Ok(())
    }
}
