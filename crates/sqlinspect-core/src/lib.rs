//! # sqlinspect-core
//!
//! A MySQL statement parser with a rendering AST.
//!
//! This crate provides:
//! - A hand-written lexer that understands MySQL quoting, comments and
//!   `/*! ... */` executable comments
//! - A recursive descent parser with Pratt expression parsing covering the
//!   DDL and DML statements a schema-change review needs
//! - `Display` for every AST node, so statements can be rewritten and
//!   rendered back to SQL
//!
//! ```rust
//! use sqlinspect_core::{parse_statements, Statement};
//!
//! let parsed = parse_statements("USE shop; ALTER TABLE orders ADD INDEX idx_user (user_id)")
//!     .unwrap();
//! assert_eq!(parsed.len(), 2);
//! let Statement::AlterTable(alter) = &parsed[1].statement else {
//!     unreachable!()
//! };
//! assert_eq!(alter.to_string(), "ALTER TABLE orders ADD INDEX idx_user (user_id)");
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{Expr, ParsedStatement, Statement, TableName};
pub use lexer::{Lexer, Span, Token, TokenKind};
pub use parser::{parse_statement, parse_statements, ParseError, Parser};
