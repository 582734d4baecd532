//! SQL statement AST types.

use core::fmt;

use super::ddl::{
    AlterTableStatement, CreateDatabaseStatement, CreateIndexStatement, CreateTableStatement,
    DropDatabaseStatement, DropIndexStatement, DropTableStatement, RenameTableStatement,
    TableName,
};
use super::expression::Expr;
use super::ident::{write_idents, write_list, Ident};
use crate::lexer::Span;

/// Order direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Ascending order (default).
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl OrderDirection {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// An ORDER BY clause entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// The expression to order by.
    pub expr: Expr,
    /// The direction, if written.
    pub direction: Option<OrderDirection>,
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        if let Some(direction) = self.direction {
            write!(f, " {}", direction.as_str())?;
        }
        Ok(())
    }
}

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// [INNER] JOIN
    Inner,
    /// LEFT [OUTER] JOIN
    Left,
    /// RIGHT [OUTER] JOIN
    Right,
    /// CROSS JOIN
    Cross,
}

impl JoinType {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

/// A JOIN clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause {
    /// The type of join.
    pub join_type: JoinType,
    /// The table to join.
    pub table: TableRef,
    /// The ON condition.
    pub on: Option<Expr>,
    /// USING columns (alternative to ON).
    pub using: Vec<String>,
}

/// A table reference in a FROM clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableRef {
    /// A named table.
    Table {
        /// Table name.
        name: TableName,
        /// Alias.
        alias: Option<String>,
    },
    /// A derived table.
    Subquery {
        /// The subquery.
        query: Box<SelectStatement>,
        /// Alias.
        alias: Option<String>,
    },
    /// A joined table.
    Join {
        /// Left side of the join.
        left: Box<TableRef>,
        /// The join clause.
        join: Box<JoinClause>,
    },
}

impl TableRef {
    /// Creates a simple table reference.
    #[must_use]
    pub const fn table(name: TableName) -> Self {
        Self::Table { name, alias: None }
    }

    /// Returns every named table in this reference, left to right,
    /// paired with its alias.
    #[must_use]
    pub fn tables(&self) -> Vec<(&TableName, Option<&str>)> {
        let mut out = Vec::new();
        self.collect_tables(&mut out);
        out
    }

    fn collect_tables<'a>(&'a self, out: &mut Vec<(&'a TableName, Option<&'a str>)>) {
        match self {
            Self::Table { name, alias } => out.push((name, alias.as_deref())),
            Self::Subquery { .. } => {}
            Self::Join { left, join } => {
                left.collect_tables(out);
                join.table.collect_tables(out);
            }
        }
    }

    /// Returns true if any side of this reference is a derived table.
    #[must_use]
    pub fn has_subquery(&self) -> bool {
        match self {
            Self::Table { .. } => false,
            Self::Subquery { .. } => true,
            Self::Join { left, join } => left.has_subquery() || join.table.has_subquery(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table { name, alias } => {
                write!(f, "{name}")?;
                if let Some(alias) = alias {
                    write!(f, " AS {}", Ident(alias))?;
                }
                Ok(())
            }
            Self::Subquery { query, alias } => {
                write!(f, "({query})")?;
                if let Some(alias) = alias {
                    write!(f, " AS {}", Ident(alias))?;
                }
                Ok(())
            }
            Self::Join { left, join } => {
                write!(f, "{left} {} {}", join.join_type.as_str(), join.table)?;
                if let Some(on) = &join.on {
                    write!(f, " ON {on}")?;
                }
                if !join.using.is_empty() {
                    f.write_str(" USING (")?;
                    write_idents(f, &join.using, ", ")?;
                    f.write_str(")")?;
                }
                Ok(())
            }
        }
    }
}

/// A column in a SELECT list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectColumn {
    /// The expression.
    pub expr: Expr,
    /// Column alias.
    pub alias: Option<String>,
}

impl SelectColumn {
    /// Creates a new select column.
    #[must_use]
    pub const fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }
}

impl fmt::Display for SelectColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        if let Some(alias) = &self.alias {
            write!(f, " AS {}", Ident(alias))?;
        }
        Ok(())
    }
}

/// A UNION branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionPart {
    /// UNION ALL
    pub all: bool,
    /// The branch.
    pub select: SelectStatement,
}

/// A SELECT statement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectStatement {
    /// Whether to select DISTINCT values.
    pub distinct: bool,
    /// The columns to select.
    pub columns: Vec<SelectColumn>,
    /// The FROM clause.
    pub from: Vec<TableRef>,
    /// The WHERE clause.
    pub where_clause: Option<Expr>,
    /// GROUP BY expressions.
    pub group_by: Vec<Expr>,
    /// HAVING clause.
    pub having: Option<Expr>,
    /// ORDER BY clauses.
    pub order_by: Vec<OrderBy>,
    /// LIMIT row count.
    pub limit: Option<Expr>,
    /// LIMIT offset.
    pub offset: Option<Expr>,
    /// FOR UPDATE
    pub for_update: bool,
    /// Trailing UNION branches.
    pub unions: Vec<UnionPart>,
}

impl SelectStatement {
    /// Returns true if the select list contains a bare or qualified `*`.
    #[must_use]
    pub fn has_wildcard(&self) -> bool {
        self.columns
            .iter()
            .any(|c| matches!(c.expr, Expr::Wildcard { .. }))
    }

    /// Returns every named table in the FROM clause.
    #[must_use]
    pub fn tables(&self) -> Vec<(&TableName, Option<&str>)> {
        self.from.iter().flat_map(TableRef::tables).collect()
    }
}

impl fmt::Display for SelectStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SELECT ")?;
        if self.distinct {
            f.write_str("DISTINCT ")?;
        }
        write_list(f, &self.columns, ", ")?;
        if !self.from.is_empty() {
            f.write_str(" FROM ")?;
            write_list(f, &self.from, ", ")?;
        }
        if let Some(where_clause) = &self.where_clause {
            write!(f, " WHERE {where_clause}")?;
        }
        if !self.group_by.is_empty() {
            f.write_str(" GROUP BY ")?;
            write_list(f, &self.group_by, ", ")?;
        }
        if let Some(having) = &self.having {
            write!(f, " HAVING {having}")?;
        }
        if !self.order_by.is_empty() {
            f.write_str(" ORDER BY ")?;
            write_list(f, &self.order_by, ", ")?;
        }
        if let Some(limit) = &self.limit {
            write!(f, " LIMIT {limit}")?;
        }
        if let Some(offset) = &self.offset {
            write!(f, " OFFSET {offset}")?;
        }
        if self.for_update {
            f.write_str(" FOR UPDATE")?;
        }
        for part in &self.unions {
            f.write_str(if part.all { " UNION ALL " } else { " UNION " })?;
            write!(f, "{}", part.select)?;
        }
        Ok(())
    }
}

/// An assignment in UPDATE SET, INSERT ... SET or ON DUPLICATE KEY UPDATE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateAssignment {
    /// Table qualifier.
    pub table: Option<String>,
    /// Column name.
    pub column: String,
    /// Value expression.
    pub value: Expr,
}

impl fmt::Display for UpdateAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(table) = &self.table {
            write!(f, "{}.", Ident(table))?;
        }
        write!(f, "{} = {}", Ident(&self.column), self.value)
    }
}

/// Source of rows for INSERT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertSource {
    /// VALUES (...), (...)
    Values(Vec<Vec<Expr>>),
    /// SET col = value, ...
    Set(Vec<UpdateAssignment>),
    /// SELECT ...
    Query(Box<SelectStatement>),
}

/// An INSERT or REPLACE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertStatement {
    /// REPLACE instead of INSERT.
    pub replace: bool,
    /// IGNORE
    pub ignore: bool,
    /// Target table.
    pub table: TableName,
    /// Explicit column list.
    pub columns: Vec<String>,
    /// Row source.
    pub source: InsertSource,
    /// ON DUPLICATE KEY UPDATE assignments.
    pub on_duplicate: Vec<UpdateAssignment>,
}

impl InsertStatement {
    /// Returns the number of literal rows, zero for INSERT ... SELECT.
    #[must_use]
    pub fn row_count(&self) -> usize {
        match &self.source {
            InsertSource::Values(rows) => rows.len(),
            InsertSource::Set(_) => 1,
            InsertSource::Query(_) => 0,
        }
    }
}

impl fmt::Display for InsertStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.replace { "REPLACE " } else { "INSERT " })?;
        if self.ignore {
            f.write_str("IGNORE ")?;
        }
        write!(f, "INTO {}", self.table)?;
        if !self.columns.is_empty() {
            f.write_str(" (")?;
            write_idents(f, &self.columns, ", ")?;
            f.write_str(")")?;
        }
        match &self.source {
            InsertSource::Values(rows) => {
                f.write_str(" VALUES ")?;
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str("(")?;
                    write_list(f, row, ", ")?;
                    f.write_str(")")?;
                }
            }
            InsertSource::Set(assignments) => {
                f.write_str(" SET ")?;
                write_list(f, assignments, ", ")?;
            }
            InsertSource::Query(query) => write!(f, " {query}")?,
        }
        if !self.on_duplicate.is_empty() {
            f.write_str(" ON DUPLICATE KEY UPDATE ")?;
            write_list(f, &self.on_duplicate, ", ")?;
        }
        Ok(())
    }
}

/// An UPDATE statement, single or multi-table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStatement {
    /// Table references.
    pub tables: Vec<TableRef>,
    /// SET assignments.
    pub assignments: Vec<UpdateAssignment>,
    /// WHERE clause.
    pub where_clause: Option<Expr>,
    /// ORDER BY clauses.
    pub order_by: Vec<OrderBy>,
    /// LIMIT row count.
    pub limit: Option<Expr>,
}

impl UpdateStatement {
    /// Returns the table and alias when exactly one plain table is updated.
    #[must_use]
    pub fn single_table(&self) -> Option<(&TableName, Option<&str>)> {
        match self.tables.as_slice() {
            [TableRef::Table { name, alias }] => Some((name, alias.as_deref())),
            _ => None,
        }
    }
}

impl fmt::Display for UpdateStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UPDATE ")?;
        write_list(f, &self.tables, ", ")?;
        f.write_str(" SET ")?;
        write_list(f, &self.assignments, ", ")?;
        if let Some(where_clause) = &self.where_clause {
            write!(f, " WHERE {where_clause}")?;
        }
        if !self.order_by.is_empty() {
            f.write_str(" ORDER BY ")?;
            write_list(f, &self.order_by, ", ")?;
        }
        if let Some(limit) = &self.limit {
            write!(f, " LIMIT {limit}")?;
        }
        Ok(())
    }
}

/// A DELETE statement, single or multi-table.
///
/// For the single-table form `targets` is empty and `from` holds one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteStatement {
    /// Tables whose rows are deleted (multi-table form).
    pub targets: Vec<TableName>,
    /// FROM table references.
    pub from: Vec<TableRef>,
    /// WHERE clause.
    pub where_clause: Option<Expr>,
    /// ORDER BY clauses.
    pub order_by: Vec<OrderBy>,
    /// LIMIT row count.
    pub limit: Option<Expr>,
}

impl DeleteStatement {
    /// Returns the table and alias for the single-table form.
    #[must_use]
    pub fn single_table(&self) -> Option<(&TableName, Option<&str>)> {
        if !self.targets.is_empty() {
            return None;
        }
        match self.from.as_slice() {
            [TableRef::Table { name, alias }] => Some((name, alias.as_deref())),
            _ => None,
        }
    }
}

impl fmt::Display for DeleteStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DELETE ")?;
        if !self.targets.is_empty() {
            write_list(f, &self.targets, ", ")?;
            f.write_str(" ")?;
        }
        f.write_str("FROM ")?;
        write_list(f, &self.from, ", ")?;
        if let Some(where_clause) = &self.where_clause {
            write!(f, " WHERE {where_clause}")?;
        }
        if !self.order_by.is_empty() {
            f.write_str(" ORDER BY ")?;
            write_list(f, &self.order_by, ", ")?;
        }
        if let Some(limit) = &self.limit {
            write!(f, " LIMIT {limit}")?;
        }
        Ok(())
    }
}

/// Scope of a SET variable assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableScope {
    /// `@name`
    User,
    /// `SESSION name` or bare `name`
    Session,
    /// `GLOBAL name`
    Global,
}

/// One item of a SET statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetItem {
    /// A variable assignment.
    Variable {
        /// Scope.
        scope: VariableScope,
        /// Variable name.
        name: String,
        /// Assigned value.
        value: Expr,
    },
    /// SET NAMES charset
    Names {
        /// Character set.
        charset: String,
    },
}

impl fmt::Display for SetItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable { scope, name, value } => match scope {
                VariableScope::User => write!(
                    f,
                    "{} = {value}",
                    Expr::Variable {
                        name: name.clone(),
                        system: false
                    }
                ),
                VariableScope::Session => write!(f, "SESSION {} = {value}", Ident(name)),
                VariableScope::Global => write!(f, "GLOBAL {} = {value}", Ident(name)),
            },
            Self::Names { charset } => write!(f, "NAMES {}", Ident(charset)),
        }
    }
}

/// A SET statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetStatement {
    /// Assignments.
    pub items: Vec<SetItem>,
}

impl fmt::Display for SetStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SET ")?;
        write_list(f, &self.items, ", ")
    }
}

/// Transaction control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatement {
    /// BEGIN / START TRANSACTION
    Begin,
    /// COMMIT
    Commit,
    /// ROLLBACK
    Rollback,
}

impl fmt::Display for TransactionStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Begin => "BEGIN",
            Self::Commit => "COMMIT",
            Self::Rollback => "ROLLBACK",
        })
    }
}

/// A SQL statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// SELECT statement.
    Select(SelectStatement),
    /// INSERT or REPLACE statement.
    Insert(InsertStatement),
    /// UPDATE statement.
    Update(UpdateStatement),
    /// DELETE statement.
    Delete(DeleteStatement),
    /// CREATE TABLE statement.
    CreateTable(CreateTableStatement),
    /// ALTER TABLE statement.
    AlterTable(AlterTableStatement),
    /// DROP TABLE statement.
    DropTable(DropTableStatement),
    /// RENAME TABLE statement.
    RenameTable(RenameTableStatement),
    /// CREATE INDEX statement.
    CreateIndex(CreateIndexStatement),
    /// DROP INDEX statement.
    DropIndex(DropIndexStatement),
    /// CREATE DATABASE statement.
    CreateDatabase(CreateDatabaseStatement),
    /// DROP DATABASE statement.
    DropDatabase(DropDatabaseStatement),
    /// USE schema
    Use {
        /// Schema to switch to.
        schema: String,
    },
    /// SET statement.
    Set(SetStatement),
    /// Transaction control.
    Transaction(TransactionStatement),
    /// Text the grammar does not understand.
    Unparsed {
        /// The statement text.
        text: String,
        /// Why parsing failed.
        reason: String,
    },
}

impl Statement {
    /// Returns true for schema-changing statements.
    #[must_use]
    pub const fn is_ddl(&self) -> bool {
        matches!(
            self,
            Self::CreateTable(_)
                | Self::AlterTable(_)
                | Self::DropTable(_)
                | Self::RenameTable(_)
                | Self::CreateIndex(_)
                | Self::DropIndex(_)
                | Self::CreateDatabase(_)
                | Self::DropDatabase(_)
        )
    }

    /// Returns true for row-changing statements.
    #[must_use]
    pub const fn is_dml(&self) -> bool {
        matches!(self, Self::Insert(_) | Self::Update(_) | Self::Delete(_))
    }

    /// Returns a short upper-case label such as `ALTER TABLE`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Select(_) => "SELECT",
            Self::Insert(insert) => {
                if insert.replace {
                    "REPLACE"
                } else {
                    "INSERT"
                }
            }
            Self::Update(_) => "UPDATE",
            Self::Delete(_) => "DELETE",
            Self::CreateTable(_) => "CREATE TABLE",
            Self::AlterTable(_) => "ALTER TABLE",
            Self::DropTable(_) => "DROP TABLE",
            Self::RenameTable(_) => "RENAME TABLE",
            Self::CreateIndex(_) => "CREATE INDEX",
            Self::DropIndex(_) => "DROP INDEX",
            Self::CreateDatabase(_) => "CREATE DATABASE",
            Self::DropDatabase(_) => "DROP DATABASE",
            Self::Use { .. } => "USE",
            Self::Set(_) => "SET",
            Self::Transaction(_) => "TRANSACTION",
            Self::Unparsed { .. } => "UNPARSED",
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select(s) => write!(f, "{s}"),
            Self::Insert(s) => write!(f, "{s}"),
            Self::Update(s) => write!(f, "{s}"),
            Self::Delete(s) => write!(f, "{s}"),
            Self::CreateTable(s) => write!(f, "{s}"),
            Self::AlterTable(s) => write!(f, "{s}"),
            Self::DropTable(s) => write!(f, "{s}"),
            Self::RenameTable(s) => write!(f, "{s}"),
            Self::CreateIndex(s) => write!(f, "{s}"),
            Self::DropIndex(s) => write!(f, "{s}"),
            Self::CreateDatabase(s) => write!(f, "{s}"),
            Self::DropDatabase(s) => write!(f, "{s}"),
            Self::Use { schema } => write!(f, "USE {}", Ident(schema)),
            Self::Set(s) => write!(f, "{s}"),
            Self::Transaction(s) => write!(f, "{s}"),
            Self::Unparsed { text, .. } => f.write_str(text),
        }
    }
}

/// A statement together with its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedStatement {
    /// The parsed statement.
    pub statement: Statement,
    /// Source text, trimmed and without the trailing `;`.
    pub text: String,
    /// Position of the text in the input.
    pub span: Span,
}
