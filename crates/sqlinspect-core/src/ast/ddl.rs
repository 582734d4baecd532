//! Data definition statements.

use core::fmt;

use super::expression::{Expr, Literal};
use super::ident::{write_idents, write_list, Ident, Quoted};
use super::statement::OrderDirection;
use super::types::{ColumnDef, ColumnOption, ColumnPosition};

/// A possibly schema-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    /// Schema qualifier.
    pub schema: Option<String>,
    /// Table name.
    pub name: String,
}

impl TableName {
    /// Creates an unqualified table name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    /// Creates a schema-qualified table name.
    #[must_use]
    pub fn qualified(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    /// Renders the name with every part backquoted.
    #[must_use]
    pub fn quoted(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", Quoted(schema), Quoted(&self.name)),
            None => Quoted(&self.name).to_string(),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(schema) = &self.schema {
            write!(f, "{}.", Ident(schema))?;
        }
        write!(f, "{}", Ident(&self.name))
    }
}

/// A column inside an index definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumn {
    /// Column name.
    pub name: String,
    /// Prefix length.
    pub length: Option<u32>,
    /// Sort direction, if written.
    pub direction: Option<OrderDirection>,
}

impl IndexColumn {
    /// Creates an index column without prefix or direction.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            length: None,
            direction: None,
        }
    }
}

impl fmt::Display for IndexColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Ident(&self.name))?;
        if let Some(length) = self.length {
            write!(f, "({length})")?;
        }
        if let Some(direction) = self.direction {
            write!(f, " {}", direction.as_str())?;
        }
        Ok(())
    }
}

/// Index options following the column list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOption {
    /// USING BTREE / HASH
    Using(String),
    /// COMMENT 'text'
    Comment(Literal),
}

impl fmt::Display for IndexOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Using(method) => write!(f, "USING {method}"),
            Self::Comment(text) => write!(f, "COMMENT {text}"),
        }
    }
}

/// The referenced side of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRef {
    /// Referenced table.
    pub table: TableName,
    /// Referenced columns.
    pub columns: Vec<String>,
    /// ON DELETE action, as written.
    pub on_delete: Option<String>,
    /// ON UPDATE action, as written.
    pub on_update: Option<String>,
}

/// Kind of a table-level constraint or index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    /// PRIMARY KEY
    PrimaryKey,
    /// UNIQUE INDEX
    Unique,
    /// INDEX / KEY
    Index,
    /// FULLTEXT INDEX
    Fulltext,
    /// FOREIGN KEY ... REFERENCES
    ForeignKey(ForeignKeyRef),
    /// CHECK (expr)
    Check(Expr),
}

/// A table-level constraint or index definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConstraint {
    /// Constraint or index name.
    pub name: Option<String>,
    /// What kind of constraint this is.
    pub kind: ConstraintKind,
    /// Indexed columns (empty for CHECK).
    pub columns: Vec<IndexColumn>,
    /// Trailing index options.
    pub options: Vec<IndexOption>,
}

impl TableConstraint {
    /// Creates a constraint without options.
    #[must_use]
    pub fn new(name: Option<String>, kind: ConstraintKind, columns: Vec<IndexColumn>) -> Self {
        Self {
            name,
            kind,
            columns,
            options: Vec::new(),
        }
    }

    /// Returns true for PRIMARY KEY.
    #[must_use]
    pub const fn is_primary_key(&self) -> bool {
        matches!(self.kind, ConstraintKind::PrimaryKey)
    }

    /// Returns true for constraints that are backed by an index
    /// droppable with DROP INDEX.
    #[must_use]
    pub const fn is_index(&self) -> bool {
        matches!(
            self.kind,
            ConstraintKind::Unique | ConstraintKind::Index | ConstraintKind::Fulltext
        )
    }

    /// Returns true for FOREIGN KEY.
    #[must_use]
    pub const fn is_foreign_key(&self) -> bool {
        matches!(self.kind, ConstraintKind::ForeignKey(_))
    }

    /// Returns the indexed column names.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Returns true if the constraint has the given name (case-insensitive).
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.name
            .as_deref()
            .is_some_and(|own| own.eq_ignore_ascii_case(name))
    }

    fn write_columns(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        write_list(f, &self.columns, ",")?;
        f.write_str(")")
    }
}

impl fmt::Display for TableConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ConstraintKind::PrimaryKey => {
                f.write_str("PRIMARY KEY ")?;
                self.write_columns(f)?;
            }
            ConstraintKind::Unique | ConstraintKind::Index | ConstraintKind::Fulltext => {
                f.write_str(match self.kind {
                    ConstraintKind::Unique => "UNIQUE INDEX ",
                    ConstraintKind::Fulltext => "FULLTEXT INDEX ",
                    _ => "INDEX ",
                })?;
                if let Some(name) = &self.name {
                    write!(f, "{} ", Ident(name))?;
                }
                self.write_columns(f)?;
            }
            ConstraintKind::ForeignKey(reference) => {
                if let Some(name) = &self.name {
                    write!(f, "CONSTRAINT {} ", Ident(name))?;
                }
                f.write_str("FOREIGN KEY ")?;
                self.write_columns(f)?;
                write!(f, " REFERENCES {} (", reference.table)?;
                write_idents(f, &reference.columns, ",")?;
                f.write_str(")")?;
                if let Some(action) = &reference.on_delete {
                    write!(f, " ON DELETE {action}")?;
                }
                if let Some(action) = &reference.on_update {
                    write!(f, " ON UPDATE {action}")?;
                }
            }
            ConstraintKind::Check(expr) => {
                if let Some(name) = &self.name {
                    write!(f, "CONSTRAINT {} ", Ident(name))?;
                }
                write!(f, "CHECK ({expr})")?;
            }
        }
        for option in &self.options {
            write!(f, " {option}")?;
        }
        Ok(())
    }
}

/// A table option such as `ENGINE=InnoDB` or `DEFAULT CHARSET=utf8mb4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOption {
    /// Option name in upper case (`ENGINE`, `DEFAULT CHARSET`, `COMMENT`).
    pub name: String,
    /// Option value.
    pub value: Expr,
}

impl TableOption {
    /// Returns the option name without a leading `DEFAULT`.
    #[must_use]
    pub fn key(&self) -> &str {
        self.name.strip_prefix("DEFAULT ").unwrap_or(&self.name)
    }

    /// Returns the value as plain text (identifier or string content).
    #[must_use]
    pub fn value_text(&self) -> String {
        match &self.value {
            Expr::Column { name, .. } => name.clone(),
            Expr::Literal(lit) => lit
                .as_str()
                .map_or_else(|| lit.to_string(), ToString::to_string),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for TableOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// CREATE TABLE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableStatement {
    /// TEMPORARY
    pub temporary: bool,
    /// IF NOT EXISTS
    pub if_not_exists: bool,
    /// Table being created.
    pub table: TableName,
    /// Column definitions.
    pub columns: Vec<ColumnDef>,
    /// Table-level constraints and indexes.
    pub constraints: Vec<TableConstraint>,
    /// Table options.
    pub options: Vec<TableOption>,
    /// `LIKE source` form.
    pub like: Option<TableName>,
}

impl CreateTableStatement {
    /// Creates an empty definition for `table`.
    #[must_use]
    pub const fn new(table: TableName) -> Self {
        Self {
            temporary: false,
            if_not_exists: false,
            table,
            columns: Vec::new(),
            constraints: Vec::new(),
            options: Vec::new(),
            like: None,
        }
    }

    /// Looks up a column by name (case-insensitive).
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Looks up a column mutably by name (case-insensitive).
    pub fn column_mut(&mut self, name: &str) -> Option<&mut ColumnDef> {
        self.columns
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Returns the position of a column (case-insensitive).
    #[must_use]
    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Returns the column names in table order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Returns the primary key column names, from the PRIMARY KEY
    /// constraint or from inline `PRIMARY KEY` column attributes.
    #[must_use]
    pub fn primary_key_columns(&self) -> Vec<&str> {
        if let Some(pk) = self.constraints.iter().find(|c| c.is_primary_key()) {
            return pk.column_names();
        }
        self.columns
            .iter()
            .filter(|c| c.is_primary_key())
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Returns true if the table has a primary key.
    #[must_use]
    pub fn has_primary_key(&self) -> bool {
        !self.primary_key_columns().is_empty()
    }

    /// Looks up a named index or constraint (case-insensitive).
    #[must_use]
    pub fn constraint(&self, name: &str) -> Option<&TableConstraint> {
        self.constraints.iter().find(|c| c.has_name(name))
    }

    /// Returns the names of all named indexes and constraints.
    #[must_use]
    pub fn index_names(&self) -> Vec<&str> {
        self.constraints
            .iter()
            .filter_map(|c| c.name.as_deref())
            .collect()
    }

    /// Returns the value of a table option such as `ENGINE` or `CHARSET`.
    #[must_use]
    pub fn option_value(&self, key: &str) -> Option<String> {
        self.options
            .iter()
            .find(|option| option.key().eq_ignore_ascii_case(key))
            .map(TableOption::value_text)
    }

    /// Removes the primary key, both the constraint and inline attributes.
    pub fn drop_primary_key(&mut self) {
        self.constraints.retain(|c| !c.is_primary_key());
        for column in &mut self.columns {
            column
                .options
                .retain(|option| *option != ColumnOption::PrimaryKey);
        }
    }
}

impl fmt::Display for CreateTableStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CREATE ")?;
        if self.temporary {
            f.write_str("TEMPORARY ")?;
        }
        f.write_str("TABLE ")?;
        if self.if_not_exists {
            f.write_str("IF NOT EXISTS ")?;
        }
        write!(f, "{}", self.table)?;
        if let Some(like) = &self.like {
            return write!(f, " LIKE {like}");
        }
        f.write_str(" (")?;
        write_list(f, &self.columns, ", ")?;
        if !self.constraints.is_empty() {
            f.write_str(", ")?;
            write_list(f, &self.constraints, ", ")?;
        }
        f.write_str(")")?;
        for option in &self.options {
            write!(f, " {option}")?;
        }
        Ok(())
    }
}

/// What ALTER COLUMN does to the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterColumnAction {
    /// SET DEFAULT expr
    SetDefault(Expr),
    /// DROP DEFAULT
    DropDefault,
}

/// One clause of an ALTER TABLE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterSpec {
    /// ADD [COLUMN] def, or ADD [COLUMN] (def, ...)
    AddColumns {
        /// New columns.
        columns: Vec<ColumnDef>,
        /// Placement of a single added column.
        position: Option<ColumnPosition>,
    },
    /// ADD constraint
    AddConstraint(TableConstraint),
    /// DROP [COLUMN] name
    DropColumn {
        /// Column name.
        name: String,
    },
    /// DROP INDEX|KEY name
    DropIndex {
        /// Index name.
        name: String,
    },
    /// DROP PRIMARY KEY
    DropPrimaryKey,
    /// DROP FOREIGN KEY name
    DropForeignKey {
        /// Constraint name.
        name: String,
    },
    /// CHANGE [COLUMN] old def
    ChangeColumn {
        /// Current column name.
        old_name: String,
        /// New definition, possibly renamed.
        column: ColumnDef,
        /// Placement.
        position: Option<ColumnPosition>,
    },
    /// MODIFY [COLUMN] def
    ModifyColumn {
        /// New definition.
        column: ColumnDef,
        /// Placement.
        position: Option<ColumnPosition>,
    },
    /// ALTER [COLUMN] name SET DEFAULT expr | DROP DEFAULT
    AlterColumn {
        /// Column name.
        name: String,
        /// What happens to the default.
        action: AlterColumnAction,
    },
    /// RENAME INDEX|KEY from TO to
    RenameIndex {
        /// Current name.
        from: String,
        /// New name.
        to: String,
    },
    /// RENAME COLUMN from TO to
    RenameColumn {
        /// Current name.
        from: String,
        /// New name.
        to: String,
    },
    /// RENAME [TO|AS] table
    RenameTable {
        /// New table name.
        to: TableName,
    },
    /// Table options (ENGINE=..., COMMENT=...).
    Options(Vec<TableOption>),
}

fn write_position(f: &mut fmt::Formatter<'_>, position: Option<&ColumnPosition>) -> fmt::Result {
    match position {
        Some(position) => write!(f, " {position}"),
        None => Ok(()),
    }
}

impl fmt::Display for AlterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddColumns { columns, position } => {
                if let [column] = columns.as_slice() {
                    write!(f, "ADD COLUMN {column}")?;
                    write_position(f, position.as_ref())
                } else {
                    f.write_str("ADD COLUMN (")?;
                    write_list(f, columns, ", ")?;
                    f.write_str(")")
                }
            }
            Self::AddConstraint(constraint) => write!(f, "ADD {constraint}"),
            Self::DropColumn { name } => write!(f, "DROP COLUMN {}", Ident(name)),
            Self::DropIndex { name } => write!(f, "DROP INDEX {}", Ident(name)),
            Self::DropPrimaryKey => f.write_str("DROP PRIMARY KEY"),
            Self::DropForeignKey { name } => write!(f, "DROP FOREIGN KEY {}", Ident(name)),
            Self::ChangeColumn {
                old_name,
                column,
                position,
            } => {
                write!(f, "CHANGE COLUMN {} {column}", Ident(old_name))?;
                write_position(f, position.as_ref())
            }
            Self::ModifyColumn { column, position } => {
                write!(f, "MODIFY COLUMN {column}")?;
                write_position(f, position.as_ref())
            }
            Self::AlterColumn { name, action } => match action {
                AlterColumnAction::SetDefault(expr) => {
                    write!(f, "ALTER COLUMN {} SET DEFAULT {expr}", Ident(name))
                }
                AlterColumnAction::DropDefault => {
                    write!(f, "ALTER COLUMN {} DROP DEFAULT", Ident(name))
                }
            },
            Self::RenameIndex { from, to } => {
                write!(f, "RENAME INDEX {} TO {}", Ident(from), Ident(to))
            }
            Self::RenameColumn { from, to } => {
                write!(f, "RENAME COLUMN {} TO {}", Ident(from), Ident(to))
            }
            Self::RenameTable { to } => write!(f, "RENAME TO {to}"),
            Self::Options(options) => write_list(f, options, " "),
        }
    }
}

/// ALTER TABLE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlterTableStatement {
    /// Table being altered.
    pub table: TableName,
    /// Clauses in source order.
    pub specs: Vec<AlterSpec>,
}

impl AlterTableStatement {
    /// Creates an ALTER TABLE statement.
    #[must_use]
    pub const fn new(table: TableName, specs: Vec<AlterSpec>) -> Self {
        Self { table, specs }
    }

    /// Returns the final RENAME target; the last one wins.
    #[must_use]
    pub fn renamed_to(&self) -> Option<&TableName> {
        self.specs.iter().rev().find_map(|spec| match spec {
            AlterSpec::RenameTable { to } => Some(to),
            _ => None,
        })
    }
}

impl fmt::Display for AlterTableStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ALTER TABLE {} ", self.table)?;
        write_list(f, &self.specs, ", ")
    }
}

/// DROP TABLE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTableStatement {
    /// TEMPORARY
    pub temporary: bool,
    /// IF EXISTS
    pub if_exists: bool,
    /// Tables to drop.
    pub tables: Vec<TableName>,
}

impl fmt::Display for DropTableStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DROP ")?;
        if self.temporary {
            f.write_str("TEMPORARY ")?;
        }
        f.write_str("TABLE ")?;
        if self.if_exists {
            f.write_str("IF EXISTS ")?;
        }
        write_list(f, &self.tables, ", ")
    }
}

/// One `from TO to` pair of RENAME TABLE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePair {
    /// Current name.
    pub from: TableName,
    /// New name.
    pub to: TableName,
}

impl fmt::Display for RenamePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} TO {}", self.from, self.to)
    }
}

/// RENAME TABLE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameTableStatement {
    /// Renames applied left to right.
    pub pairs: Vec<RenamePair>,
}

impl fmt::Display for RenameTableStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RENAME TABLE ")?;
        write_list(f, &self.pairs, ", ")
    }
}

/// CREATE INDEX statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIndexStatement {
    /// Index kind (Index, Unique or Fulltext).
    pub kind: ConstraintKind,
    /// Index name.
    pub name: String,
    /// Indexed table.
    pub table: TableName,
    /// Indexed columns.
    pub columns: Vec<IndexColumn>,
    /// Trailing options.
    pub options: Vec<IndexOption>,
}

impl CreateIndexStatement {
    /// Returns the equivalent table-level index definition.
    #[must_use]
    pub fn to_constraint(&self) -> TableConstraint {
        TableConstraint {
            name: Some(self.name.clone()),
            kind: self.kind.clone(),
            columns: self.columns.clone(),
            options: self.options.clone(),
        }
    }
}

impl fmt::Display for CreateIndexStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CREATE ")?;
        match self.kind {
            ConstraintKind::Unique => f.write_str("UNIQUE ")?,
            ConstraintKind::Fulltext => f.write_str("FULLTEXT ")?,
            _ => {}
        }
        write!(f, "INDEX {} ON {} (", Ident(&self.name), self.table)?;
        write_list(f, &self.columns, ",")?;
        f.write_str(")")?;
        for option in &self.options {
            write!(f, " {option}")?;
        }
        Ok(())
    }
}

/// DROP INDEX statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropIndexStatement {
    /// IF EXISTS
    pub if_exists: bool,
    /// Index name.
    pub name: String,
    /// Table owning the index.
    pub table: TableName,
}

impl fmt::Display for DropIndexStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DROP INDEX ")?;
        if self.if_exists {
            f.write_str("IF EXISTS ")?;
        }
        write!(f, "{} ON {}", Ident(&self.name), self.table)
    }
}

/// CREATE DATABASE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDatabaseStatement {
    /// IF NOT EXISTS
    pub if_not_exists: bool,
    /// Database name.
    pub name: String,
    /// CHARACTER SET / COLLATE options.
    pub options: Vec<TableOption>,
}

impl CreateDatabaseStatement {
    /// Returns the value of an option such as `CHARSET` or `COLLATE`.
    #[must_use]
    pub fn option_value(&self, key: &str) -> Option<String> {
        self.options
            .iter()
            .find(|option| option.key().eq_ignore_ascii_case(key))
            .map(TableOption::value_text)
    }
}

impl fmt::Display for CreateDatabaseStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CREATE DATABASE ")?;
        if self.if_not_exists {
            f.write_str("IF NOT EXISTS ")?;
        }
        write!(f, "{}", Ident(&self.name))?;
        for option in &self.options {
            write!(f, " {option}")?;
        }
        Ok(())
    }
}

/// DROP DATABASE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropDatabaseStatement {
    /// IF EXISTS
    pub if_exists: bool,
    /// Database name.
    pub name: String,
}

impl fmt::Display for DropDatabaseStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DROP DATABASE ")?;
        if self.if_exists {
            f.write_str("IF EXISTS ")?;
        }
        write!(f, "{}", Ident(&self.name))
    }
}
