//! Analysis sessions.
//!
//! A [`Session`] reads SQL text statement by statement. Each statement is
//! audited and, when asked, rolled back against the catalog as it stands
//! before the statement; then the statement's effect is committed to the
//! catalog so the next statement sees it.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use sqlinspect::config::InspectConfig;
//! use sqlinspect::rules::RuleCatalog;
//! use sqlinspect::session::Session;
//!
//! # tokio_test::block_on(async {
//! let mut session = Session::new(
//!     None,
//!     Arc::new(RuleCatalog::builtin()),
//!     Arc::new(InspectConfig::default()),
//! );
//! let result = session
//!     .audit("CREATE DATABASE shop; CREATE TABLE shop.t1 (id int)")
//!     .await
//!     .unwrap();
//! assert!(result.has_rule("ddl_check_pk_not_exist"));
//! # });
//! ```

use std::sync::Arc;

use serde::Serialize;
use sqlinspect_core::{parse_statements, ParsedStatement, Statement};
use tracing::{debug, warn};

use crate::audit::{advise_online_schema_change, validate, AuditResult, Level};
use crate::catalog::{Catalog, CatalogSnapshot, CatalogView};
use crate::config::InspectConfig;
use crate::connection::Connection;
use crate::error::Result;
use crate::rollback::{self, Rollback};
use crate::rules::RuleCatalog;

/// Where a statement is in its pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Parsed,
    Validated,
    RuleEvaluated,
    RollbackGenerated,
    Committed,
}

impl Stage {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Parsed => "parsed",
            Self::Validated => "validated",
            Self::RuleEvaluated => "rule_evaluated",
            Self::RollbackGenerated => "rollback_generated",
            Self::Committed => "committed",
        }
    }
}

fn log_stage(stage: Stage, parsed: &ParsedStatement) {
    debug!(
        stage = stage.as_str(),
        kind = parsed.statement.kind(),
        sql = %parsed.text,
        "Statement stage"
    );
}

/// What to produce for each statement.
#[derive(Debug, Clone, Copy)]
struct Steps {
    audit: bool,
    rollback: bool,
}

/// The audit and rollback of one statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inspection {
    /// Statement text as written.
    pub sql: String,
    /// Statement kind, such as `ALTER TABLE`.
    pub kind: &'static str,
    /// Findings.
    pub audit: AuditResult,
    /// Statements undoing this one.
    pub rollback: Rollback,
}

/// One analysis session over a catalog.
///
/// The rule catalog and configuration are shared; the catalog is owned.
#[derive(Debug)]
pub struct Session {
    catalog: Catalog,
    rules: Arc<RuleCatalog>,
    config: Arc<InspectConfig>,
}

impl Session {
    /// Creates a session; `None` runs it offline.
    #[must_use]
    pub fn new(
        connection: Option<Arc<dyn Connection>>,
        rules: Arc<RuleCatalog>,
        config: Arc<InspectConfig>,
    ) -> Self {
        Self {
            catalog: Catalog::new(connection),
            rules,
            config,
        }
    }

    /// Creates a session that continues from an earlier snapshot.
    #[must_use]
    pub fn with_parent(
        connection: Option<Arc<dyn Connection>>,
        parent: Arc<CatalogSnapshot>,
        rules: Arc<RuleCatalog>,
        config: Arc<InspectConfig>,
    ) -> Self {
        Self {
            catalog: Catalog::with_parent(connection, parent),
            rules,
            config,
        }
    }

    /// Returns the catalog.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Returns the shared configuration.
    #[must_use]
    pub fn config(&self) -> &InspectConfig {
        &self.config
    }

    /// Freezes the catalog so later sessions can continue from it.
    #[must_use]
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.catalog.snapshot()
    }

    /// Selects the default schema, as `USE` does.
    pub async fn use_schema(&mut self, name: &str) -> Result<()> {
        self.catalog.use_schema(name).await
    }

    /// Audits every statement of `text` and merges the findings.
    pub async fn audit(&mut self, text: &str) -> Result<AuditResult> {
        let mut merged = AuditResult::new();
        for (_, result) in self.audit_batch(text).await? {
            merged.merge(result);
        }
        Ok(merged)
    }

    /// Audits every statement of `text`, one result per statement.
    pub async fn audit_batch(&mut self, text: &str) -> Result<Vec<(ParsedStatement, AuditResult)>> {
        let steps = Steps {
            audit: true,
            rollback: false,
        };
        let mut results = Vec::new();
        for parsed in parse_statements(text)? {
            let (result, _) = self.process(&parsed, steps).await?;
            results.push((parsed, result));
        }
        Ok(results)
    }

    /// Produces the rollback of the whole of `text`.
    pub async fn generate_rollback(&mut self, text: &str) -> Result<Rollback> {
        let steps = Steps {
            audit: false,
            rollback: true,
        };
        let mut parts = Vec::new();
        for parsed in parse_statements(text)? {
            let (_, rollback) = self.process(&parsed, steps).await?;
            parts.push(rollback);
        }
        Ok(Rollback::combine(parts))
    }

    /// Audits and rolls back every statement of `text` with a single
    /// commit per statement.
    pub async fn inspect_batch(&mut self, text: &str) -> Result<Vec<Inspection>> {
        let steps = Steps {
            audit: true,
            rollback: true,
        };
        let mut inspections = Vec::new();
        for parsed in parse_statements(text)? {
            let (audit, rollback) = self.process(&parsed, steps).await?;
            inspections.push(Inspection {
                kind: parsed.statement.kind(),
                sql: parsed.text,
                audit,
                rollback,
            });
        }
        Ok(inspections)
    }

    /// Like [`Self::inspect_batch`], merged over the whole text.
    pub async fn inspect(&mut self, text: &str) -> Result<(AuditResult, Rollback)> {
        let mut merged = AuditResult::new();
        let mut parts = Vec::new();
        for inspection in self.inspect_batch(text).await? {
            merged.merge(inspection.audit);
            parts.push(inspection.rollback);
        }
        Ok((merged, Rollback::combine(parts)))
    }

    async fn process(
        &mut self,
        parsed: &ParsedStatement,
        steps: Steps,
    ) -> Result<(AuditResult, Rollback)> {
        log_stage(Stage::Parsed, parsed);
        let statement = &parsed.statement;
        let mut result = AuditResult::new();
        if steps.audit {
            validate(&mut self.catalog, statement, &mut result).await?;
            if result.level() == Level::Error {
                warn!(sql = %parsed.text, findings = result.messages().len(), "Statement is invalid");
            }
            log_stage(Stage::Validated, parsed);
            self.evaluate(statement, &mut result).await?;
            if let Statement::AlterTable(alter) = statement {
                if let Some(advice) =
                    advise_online_schema_change(&mut self.catalog, alter, &self.config).await?
                {
                    result.add(Level::Notice, advice);
                }
            }
            log_stage(Stage::RuleEvaluated, parsed);
        }
        let rollback = if steps.rollback {
            let mut view = CatalogView::new(&mut self.catalog);
            let rollback = rollback::generate(&mut view, statement, &self.config).await?;
            log_stage(Stage::RollbackGenerated, parsed);
            rollback
        } else {
            Rollback::empty()
        };
        self.catalog.apply_effect(statement).await?;
        log_stage(Stage::Committed, parsed);
        Ok((result, rollback))
    }

    /// Runs the rule catalog in order; offline, only rules that can run
    /// without a connection.
    async fn evaluate(&mut self, statement: &Statement, result: &mut AuditResult) -> Result<()> {
        if matches!(statement, Statement::Unparsed { .. }) {
            return Ok(());
        }
        let offline = self.catalog.is_offline();
        let rules = Arc::clone(&self.rules);
        let mut view = CatalogView::new(&mut self.catalog);
        for configured in rules.iter() {
            if offline && !configured.rule().allow_offline() {
                continue;
            }
            let messages = configured
                .rule()
                .check(&mut view, statement, configured.params())
                .await?;
            for message in messages {
                result.add_rule(configured.level(), configured.name(), message);
            }
        }
        Ok(())
    }
}
