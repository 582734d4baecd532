//! Rules over row-reading and row-changing statements.

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use sqlinspect_core::ast::{Expr, InsertSource, SelectStatement};
use sqlinspect_core::Statement;

use super::{param_u64, ready, Rule, RuleParams};
use crate::audit::Level;
use crate::catalog::CatalogView;
use crate::error::Result;

fn filter_is_invalid(filter: Option<&Expr>) -> bool {
    filter.is_none_or(Expr::is_constant)
}

fn selects_all(select: &SelectStatement) -> bool {
    select.has_wildcard() || select.unions.iter().any(|part| selects_all(&part.select))
}

/// UPDATE, DELETE and SELECT ... FROM without a real filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhereIsInvalid;

impl Rule for WhereIsInvalid {
    fn name(&self) -> &'static str {
        "dml_check_where_is_invalid"
    }

    fn description(&self) -> &'static str {
        "Statements reading or changing rows must filter on a column"
    }

    fn default_level(&self) -> Level {
        Level::Error
    }

    fn check<'a>(
        &'a self,
        _view: &'a mut CatalogView<'_>,
        statement: &'a Statement,
        _params: &'a RuleParams,
    ) -> BoxFuture<'a, Result<Vec<String>>> {
        let invalid = match statement {
            Statement::Update(update) => filter_is_invalid(update.where_clause.as_ref()),
            Statement::Delete(delete) => filter_is_invalid(delete.where_clause.as_ref()),
            Statement::Select(select) if !select.from.is_empty() => {
                filter_is_invalid(select.where_clause.as_ref())
            }
            _ => false,
        };
        let mut messages = Vec::new();
        if invalid {
            messages.push("WHERE clause is missing or always true".to_string());
        }
        ready(messages)
    }
}

/// `SELECT *`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisableSelectAllColumn;

impl Rule for DisableSelectAllColumn {
    fn name(&self) -> &'static str {
        "dml_disable_select_all_column"
    }

    fn description(&self) -> &'static str {
        "SELECT should list its columns"
    }

    fn default_level(&self) -> Level {
        Level::Notice
    }

    fn check<'a>(
        &'a self,
        _view: &'a mut CatalogView<'_>,
        statement: &'a Statement,
        _params: &'a RuleParams,
    ) -> BoxFuture<'a, Result<Vec<String>>> {
        let wildcard = match statement {
            Statement::Select(select) => selects_all(select),
            Statement::Insert(insert) => {
                matches!(&insert.source, InsertSource::Query(select) if selects_all(select))
            }
            _ => false,
        };
        let mut messages = Vec::new();
        if wildcard {
            messages.push("SELECT * should be replaced by a column list".to_string());
        }
        ready(messages)
    }
}

/// INSERT with more than `max_rows` value lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchInsertListsMax;

impl Rule for BatchInsertListsMax {
    fn name(&self) -> &'static str {
        "dml_check_batch_insert_lists_max"
    }

    fn description(&self) -> &'static str {
        "INSERT should not carry more than max_rows rows"
    }

    fn default_level(&self) -> Level {
        Level::Warn
    }

    fn default_params(&self) -> RuleParams {
        let mut params = RuleParams::new();
        params.insert("max_rows".to_string(), Value::from(5000));
        params
    }

    fn check<'a>(
        &'a self,
        _view: &'a mut CatalogView<'_>,
        statement: &'a Statement,
        params: &'a RuleParams,
    ) -> BoxFuture<'a, Result<Vec<String>>> {
        let max = param_u64(params, "max_rows", 5000);
        let mut messages = Vec::new();
        if let Statement::Insert(insert) = statement {
            let rows = insert.row_count();
            if u64::try_from(rows).unwrap_or(u64::MAX) > max {
                messages.push(format!("INSERT has {rows} rows, more than {max}"));
            }
        }
        ready(messages)
    }
}

/// Plans with a full scan over more than `min_rows` rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplainAccessTypeAll;

impl Rule for ExplainAccessTypeAll {
    fn name(&self) -> &'static str {
        "dml_check_explain_access_type_all"
    }

    fn description(&self) -> &'static str {
        "Statements should not scan a whole table of more than min_rows rows"
    }

    fn default_level(&self) -> Level {
        Level::Warn
    }

    fn allow_offline(&self) -> bool {
        false
    }

    fn default_params(&self) -> RuleParams {
        let mut params = RuleParams::new();
        params.insert("min_rows".to_string(), Value::from(10000));
        params
    }

    fn check<'a>(
        &'a self,
        view: &'a mut CatalogView<'_>,
        statement: &'a Statement,
        params: &'a RuleParams,
    ) -> BoxFuture<'a, Result<Vec<String>>> {
        async move {
            let mut messages = Vec::new();
            if !matches!(
                statement,
                Statement::Select(_) | Statement::Update(_) | Statement::Delete(_)
            ) {
                return Ok(messages);
            }
            let min = param_u64(params, "min_rows", 10000);
            let Some(plan) = view.explain(&statement.to_string()).await? else {
                return Ok(messages);
            };
            for row in plan {
                let full_scan = row
                    .text("type")
                    .is_some_and(|access| access.eq_ignore_ascii_case("ALL"));
                let rows = row
                    .text("rows")
                    .and_then(|rows| rows.trim().parse::<u64>().ok())
                    .unwrap_or(0);
                if full_scan && rows > min {
                    messages.push(format!(
                        "full table scan on {} over {rows} rows",
                        row.text("table").unwrap_or_default()
                    ));
                }
            }
            Ok(messages)
        }
        .boxed()
    }
}
