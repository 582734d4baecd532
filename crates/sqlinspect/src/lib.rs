//! Static analysis and rollback generation for MySQL statements.
//!
//! `sqlinspect` reads SQL text, audits each statement against a model of
//! the target server and produces the statements that would undo it:
//!
//! - **Catalog** - The databases, tables and settings the session sees,
//!   loaded lazily from a live connection and updated by every analyzed
//!   statement
//! - **Audit** - Structural validation (missing tables, duplicate columns,
//!   ...) and online schema change advice
//! - **Rules** - A configurable catalog of independent checks with
//!   severities and parameters
//! - **Rollback** - Inverse DDL from the pre-statement catalog and inverse
//!   DML from live row snapshots
//!
//! Without a connection the session runs offline: only objects created in
//! the session are known, rules that need the server are skipped and no
//! rollback is produced.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use sqlinspect::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let rules = Arc::new(RuleCatalog::from_config(&InspectConfig::default()).unwrap());
//! let mut session = Session::new(None, rules, Arc::new(InspectConfig::default()));
//!
//! let result = session
//!     .audit("CREATE DATABASE shop; USE shop; UPDATE orders SET state = 1")
//!     .await
//!     .unwrap();
//! assert_eq!(result.level(), Level::Error);
//! assert!(result.has_rule("dml_check_where_is_invalid"));
//! # });
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Audit a file against a live server
//! sqlinspect -d mysql://root@localhost/shop audit --file change.sql
//!
//! # Print the rollback of a statement
//! sqlinspect -d mysql://root@localhost/shop rollback --sql "DELETE FROM t1 WHERE id = 3"
//!
//! # List the rules and their effective settings
//! sqlinspect --config inspect.json rules
//! ```

pub mod audit;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod connection;
pub mod error;
pub mod rollback;
pub mod rules;
pub mod session;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::audit::{AuditMessage, AuditResult, Level};
    pub use crate::catalog::{Catalog, CatalogSnapshot, CatalogView, History};
    pub use crate::config::{InspectConfig, RuleSetting};
    pub use crate::connection::{Connection, MySqlConnection, Row};
    pub use crate::error::{ConnectionError, InspectError, Result};
    pub use crate::rollback::{Rollback, RollbackUnsupported};
    pub use crate::rules::{ConfiguredRule, Rule, RuleCatalog, RuleParams};
    pub use crate::session::{Inspection, Session};
}
