//! Rollback generation.
//!
//! For a mutating statement and the catalog as it is before the statement
//! runs, produces the statements that undo it. When no rollback can be
//! produced the result carries a [`RollbackUnsupported`] reason and no
//! statements, never both.

mod ddl;
mod dml;

use core::fmt;

use serde::{Deserialize, Serialize};
use sqlinspect_core::Statement;
use tracing::debug;

use crate::catalog::CatalogView;
use crate::config::InspectConfig;
use crate::error::Result;

/// Why a statement cannot be rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RollbackUnsupported {
    /// There is no live connection to read the prior state from.
    #[error("not supported offline")]
    Offline,
    /// More rows are affected than the configured cap.
    #[error("exceeded max rows, no rollback")]
    ExceededMaxRows,
    /// The table has no primary key to address rows with.
    #[error("no primary key, no rollback")]
    NoPrimaryKey,
    /// An INSERT does not give the primary key value.
    #[error("insert without primary key value, no rollback")]
    InsertWithoutPrimaryKey,
    /// An UPDATE computes the new primary key from the row.
    #[error("primary key updated with an expression, no rollback")]
    PrimaryKeyExpression,
    /// The statement changes several tables.
    #[error("multi-table statements are not supported")]
    MultiTable,
    /// The statement filters or reads rows through a sub-query.
    #[error("sub-queries are not supported")]
    Subquery,
    /// `INSERT ... ON DUPLICATE KEY UPDATE`.
    #[error("ON DUPLICATE KEY UPDATE is not supported")]
    OnDuplicateKey,
    /// `INSERT ... SELECT`.
    #[error("INSERT ... SELECT is not supported")]
    InsertSelect,
    /// `REPLACE`.
    #[error("REPLACE is not supported")]
    Replace,
    /// The statement contains `?` markers or user variables.
    #[error("parameters and user variables are not supported")]
    Parameters,
    /// The statement was not understood.
    #[error("syntax error or unsupported construct, no rollback")]
    Unparsed,
    /// A primary or foreign key dropped through `DROP INDEX`.
    #[error("dropping a primary or foreign key with DROP INDEX is not supported")]
    DropKeyIndex,
    /// `DROP DATABASE`.
    #[error("DROP DATABASE cannot be rolled back")]
    DropDatabase,
}

/// The statements undoing one statement, or why there are none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rollback {
    /// Inverse statements, each ending with `;`, in execution order.
    pub statements: Vec<String>,
    /// Why no statement could be produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Rollback {
    /// Nothing to undo.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            statements: Vec::new(),
            reason: None,
        }
    }

    /// Rollback by the given statements.
    #[must_use]
    pub const fn statements(statements: Vec<String>) -> Self {
        Self {
            statements,
            reason: None,
        }
    }

    /// No rollback, for the given reason.
    #[must_use]
    pub fn unsupported(reason: RollbackUnsupported) -> Self {
        Self {
            statements: Vec::new(),
            reason: Some(reason.to_string()),
        }
    }

    /// Combines the rollbacks of consecutive statements into the rollback
    /// of the whole sequence: later statements are undone first.
    ///
    /// Any refusal refuses the whole sequence; the first one is reported.
    #[must_use]
    pub fn combine(parts: Vec<Self>) -> Self {
        if let Some(refused) = parts.iter().find(|part| part.reason.is_some()) {
            return refused.clone();
        }
        Self::statements(
            parts
                .into_iter()
                .rev()
                .flat_map(|part| part.statements)
                .collect(),
        )
    }

    /// Returns true if there is neither a statement nor a reason.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty() && self.reason.is_none()
    }
}

impl From<RollbackUnsupported> for Rollback {
    fn from(reason: RollbackUnsupported) -> Self {
        Self::unsupported(reason)
    }
}

impl fmt::Display for Rollback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(reason) = &self.reason {
            return write!(f, "-- {reason}");
        }
        for (i, statement) in self.statements.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(statement)?;
        }
        Ok(())
    }
}

/// Produces the rollback of one statement from the pre-statement catalog.
pub(crate) async fn generate(
    view: &mut CatalogView<'_>,
    statement: &Statement,
    config: &InspectConfig,
) -> Result<Rollback> {
    let mutating = statement.is_ddl() || statement.is_dml();
    if matches!(statement, Statement::Unparsed { .. }) {
        return Ok(RollbackUnsupported::Unparsed.into());
    }
    if !mutating {
        return Ok(Rollback::empty());
    }
    if view.is_offline() {
        return Ok(RollbackUnsupported::Offline.into());
    }
    let rollback = if statement.is_ddl() {
        ddl::rollback(view, statement).await?
    } else {
        dml::rollback(view, statement, config).await?
    };
    debug!(
        kind = statement.kind(),
        statements = rollback.statements.len(),
        reason = rollback.reason.as_deref().unwrap_or_default(),
        "Rollback generated"
    );
    Ok(rollback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_and_statements_exclusive() {
        let rollback = Rollback::unsupported(RollbackUnsupported::ExceededMaxRows);
        assert!(rollback.statements.is_empty());
        assert_eq!(rollback.reason.as_deref(), Some("exceeded max rows, no rollback"));
        assert_eq!(rollback.to_string(), "-- exceeded max rows, no rollback");
    }

    #[test]
    fn test_combine_undoes_last_statement_first() {
        let combined = Rollback::combine(vec![
            Rollback::statements(vec!["DROP DATABASE IF EXISTS d;".to_string()]),
            Rollback::empty(),
            Rollback::statements(vec!["DROP TABLE IF EXISTS d.t;".to_string()]),
        ]);
        assert_eq!(
            combined.statements,
            ["DROP TABLE IF EXISTS d.t;", "DROP DATABASE IF EXISTS d;"]
        );

        let refused = Rollback::combine(vec![
            Rollback::statements(vec!["DROP DATABASE IF EXISTS d;".to_string()]),
            RollbackUnsupported::DropDatabase.into(),
        ]);
        assert!(refused.statements.is_empty());
        assert_eq!(refused.reason.as_deref(), Some("DROP DATABASE cannot be rolled back"));
    }

    #[test]
    fn test_serialization_skips_missing_reason() {
        let rollback = Rollback::statements(vec!["DROP DATABASE IF EXISTS d;".to_string()]);
        let json = serde_json::to_string(&rollback).unwrap();
        assert_eq!(json, r#"{"statements":["DROP DATABASE IF EXISTS d;"]}"#);
    }

    #[test]
    fn test_unparsed_and_offline() {
        let mut catalog = crate::catalog::Catalog::new(None);
        let mut view = CatalogView::new(&mut catalog);
        let config = InspectConfig::default();
        let statements = sqlinspect_core::parse_statements(
            "CREATE VIEW v AS SELECT 1; DROP TABLE db.t1; SELECT 1",
        )
        .unwrap();
        let results: Vec<Rollback> = statements
            .iter()
            .map(|parsed| {
                tokio_test::block_on(generate(&mut view, &parsed.statement, &config)).unwrap()
            })
            .collect();
        assert_eq!(
            results[0].reason.as_deref(),
            Some("syntax error or unsupported construct, no rollback")
        );
        assert_eq!(results[1].reason.as_deref(), Some("not supported offline"));
        assert!(results[2].is_empty());
    }
}
