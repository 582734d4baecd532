//! Abstract Syntax Tree (AST) types for MySQL statements.
//!
//! Every node renders back to SQL through `Display`. Rendering a parsed
//! statement and parsing the result again yields the same tree.

mod ddl;
mod expression;
mod ident;
mod statement;
mod types;

pub use ddl::{
    AlterColumnAction, AlterSpec, AlterTableStatement, ConstraintKind, CreateDatabaseStatement,
    CreateIndexStatement, CreateTableStatement, DropDatabaseStatement, DropIndexStatement,
    DropTableStatement, ForeignKeyRef, IndexColumn, IndexOption, RenamePair,
    RenameTableStatement, TableConstraint, TableName, TableOption,
};
pub use expression::{BinaryOp, Expr, FunctionCall, Literal, UnaryOp};
pub use ident::{needs_quoting, Ident, Quoted};
pub use statement::{
    DeleteStatement, InsertSource, InsertStatement, JoinClause, JoinType, OrderBy, OrderDirection,
    ParsedStatement, SelectColumn, SelectStatement, SetItem, SetStatement, Statement, TableRef,
    TransactionStatement, UnionPart, UpdateAssignment, UpdateStatement, VariableScope,
};
pub use types::{ColumnDef, ColumnOption, ColumnPosition, DataType};
